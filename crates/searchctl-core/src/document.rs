//! The document model indexed by the engine.

use crate::error::{CtlError, CtlResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document as stored in the engine.
///
/// Non-empty/non-negative invariants are enforced at construction time
/// (`Document::new`/`Document::from_parts`), never by mutation afterward —
/// the core never mutates a document in place once it crosses into the
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
    pub author: String,
    #[serde(rename = "publishedAt")]
    pub published_at: DateTime<Utc>,
    #[serde(rename = "popularityScore")]
    pub popularity_score: f64,
}

impl Document {
    /// Construct a document, enforcing non-empty text fields and a
    /// non-negative popularity score.
    ///
    /// # Errors
    /// Returns [`CtlError::BadRequest`] if `title`/`body`/`category`/`author`
    /// are empty, or `popularity_score` is negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        summary: Option<String>,
        body: impl Into<String>,
        tags: Vec<String>,
        category: impl Into<String>,
        author: impl Into<String>,
        published_at: DateTime<Utc>,
        popularity_score: f64,
    ) -> CtlResult<Self> {
        let title = title.into();
        let body = body.into();
        let category = category.into();
        let author = author.into();

        if title.trim().is_empty() {
            return Err(CtlError::BadRequest("document title must not be empty".into()));
        }
        if body.trim().is_empty() {
            return Err(CtlError::BadRequest("document body must not be empty".into()));
        }
        if category.trim().is_empty() {
            return Err(CtlError::BadRequest("document category must not be empty".into()));
        }
        if author.trim().is_empty() {
            return Err(CtlError::BadRequest("document author must not be empty".into()));
        }
        if popularity_score < 0.0 {
            return Err(CtlError::BadRequest(
                "document popularityScore must be non-negative".into(),
            ));
        }

        Ok(Self {
            id,
            title,
            summary,
            body,
            tags,
            category,
            author,
            published_at,
            popularity_score,
        })
    }

    /// Sorted, comma-joined tag list, used by the content-hash serialization
    /// in the reindex validator.
    #[must_use]
    pub fn sorted_tags_joined(&self) -> String {
        let mut tags = self.tags.clone();
        tags.sort();
        tags.join(",")
    }

    /// The exact content-hash serialization string:
    /// `id|title|summary_or_empty|body|sorted_tags_comma_joined|category|author|publishedAt|popularityScore`.
    #[must_use]
    pub fn hash_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.id,
            self.title,
            self.summary.as_deref().unwrap_or(""),
            self.body,
            self.sorted_tags_joined(),
            self.category,
            self.author,
            self.published_at.to_rfc3339(),
            self.popularity_score,
        )
    }
}

/// A numbered physical index generation, `docs_v{version}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u32);

impl Generation {
    /// Construct a generation, enforcing `version >= 1`.
    ///
    /// # Errors
    /// Returns [`CtlError::BadRequest`] if `version < 1`.
    pub fn new(version: u32) -> CtlResult<Self> {
        if version < 1 {
            return Err(CtlError::BadRequest("generation version must be >= 1".into()));
        }
        Ok(Self(version))
    }

    /// The derived index name, `docs_v{version}`.
    #[must_use]
    pub fn index_name(self) -> String {
        format!("docs_v{}", self.0)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str, body: &str) -> CtlResult<Document> {
        Document::new(
            Uuid::nil(),
            title,
            Some("summary".into()),
            body,
            vec!["b".into(), "a".into()],
            "tech",
            "jane",
            Utc::now(),
            1.5,
        )
    }

    #[test]
    fn rejects_empty_title() {
        assert!(sample("", "body").is_err());
    }

    #[test]
    fn rejects_empty_body() {
        assert!(sample("title", "").is_err());
    }

    #[test]
    fn rejects_negative_popularity() {
        let err = Document::new(
            Uuid::nil(),
            "t",
            None,
            "b",
            vec![],
            "c",
            "a",
            Utc::now(),
            -1.0,
        );
        assert!(err.is_err());
    }

    #[test]
    fn tags_are_sorted_for_hashing() {
        let doc = sample("t", "b").unwrap();
        assert_eq!(doc.sorted_tags_joined(), "a,b");
    }

    #[test]
    fn generation_index_name() {
        let gen = Generation::new(3).unwrap();
        assert_eq!(gen.index_name(), "docs_v3");
    }

    #[test]
    fn generation_rejects_zero() {
        assert!(Generation::new(0).is_err());
    }
}
