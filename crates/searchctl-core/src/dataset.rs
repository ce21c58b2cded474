//! Query sets and judgement sets.

use crate::error::{CtlError, CtlResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The intent a sample query exercises; carried through to worst-query tables.
pub type Intent = String;

/// Structured filters a query carries alongside its free-text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(
        default,
        rename = "publishedAtFrom",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at_from: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "publishedAtTo",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at_to: Option<DateTime<Utc>>,
}

/// A single evaluation query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalQuery {
    #[serde(rename = "queryId")]
    pub query_id: String,
    #[serde(rename = "queryText")]
    pub query_text: String,
    pub intent: Intent,
    #[serde(default)]
    pub filters: Option<QueryFilters>,
}

/// An ordered, immutable set of evaluation queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySet {
    pub queries: Vec<EvalQuery>,
}

impl QuerySet {
    /// Load and validate a query set: `queryId` must be unique within the set.
    ///
    /// # Errors
    /// Returns [`CtlError::NotFound`] if the file is missing, or
    /// [`CtlError::BadRequest`] on duplicate `queryId`s.
    pub fn load(path: &Path) -> CtlResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|_| CtlError::NotFound(format!("query set file not found: {}", path.display())))?;
        let set: Self = serde_json::from_str(&raw)?;
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> CtlResult<()> {
        let mut seen = HashSet::new();
        for q in &self.queries {
            if !seen.insert(q.query_id.as_str()) {
                return Err(CtlError::BadRequest(format!(
                    "duplicate queryId in query set: {}",
                    q.query_id
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, query_id: &str) -> bool {
        self.queries.iter().any(|q| q.query_id == query_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// A human relevance grade, 0 (not relevant) through 3 (highly relevant).
pub type Grade = u8;

/// A single human judgement for a (query, document) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgement {
    #[serde(rename = "queryId")]
    pub query_id: String,
    #[serde(rename = "docId")]
    pub doc_id: String,
    pub grade: Grade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// An immutable set of judgements, paired against a [`QuerySet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgementSet {
    pub judgements: Vec<Judgement>,
}

impl JudgementSet {
    /// Load and validate a judgement set against its paired query set: every
    /// judgement's `queryId` must appear in `query_set`.
    ///
    /// # Errors
    /// Returns [`CtlError::NotFound`] if the file is missing, or
    /// [`CtlError::BadRequest`] if a judgement references an unknown query id
    /// or a grade is out of `0..=3`.
    pub fn load(path: &Path, query_set: &QuerySet) -> CtlResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|_| {
            CtlError::NotFound(format!("judgement set file not found: {}", path.display()))
        })?;
        let set: Self = serde_json::from_str(&raw)?;
        set.validate(query_set)?;
        Ok(set)
    }

    fn validate(&self, query_set: &QuerySet) -> CtlResult<()> {
        for j in &self.judgements {
            if j.grade > 3 {
                return Err(CtlError::BadRequest(format!(
                    "judgement grade out of range (0..=3): {}",
                    j.grade
                )));
            }
            if !query_set.contains(&j.query_id) {
                return Err(CtlError::BadRequest(format!(
                    "judgement references unknown queryId: {}",
                    j.query_id
                )));
            }
        }
        Ok(())
    }

    /// All judgements for a given query id, in file order.
    #[must_use]
    pub fn for_query<'a>(&'a self, query_id: &str) -> Vec<&'a Judgement> {
        self.judgements.iter().filter(|j| j.query_id == query_id).collect()
    }

    /// Judgement grade for a (query, doc) pair, if present.
    #[must_use]
    pub fn grade_for(&self, query_id: &str, doc_id: &str) -> Option<Grade> {
        self.judgements
            .iter()
            .find(|j| j.query_id == query_id && j.doc_id == doc_id)
            .map(|j| j.grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qs(ids: &[&str]) -> QuerySet {
        QuerySet {
            queries: ids
                .iter()
                .map(|id| EvalQuery {
                    query_id: (*id).to_string(),
                    query_text: "text".into(),
                    intent: "informational".into(),
                    filters: None,
                })
                .collect(),
        }
    }

    #[test]
    fn query_set_rejects_duplicate_ids() {
        let set = qs(&["q1", "q1"]);
        assert!(set.validate().is_err());
    }

    #[test]
    fn judgement_set_rejects_unknown_query() {
        let set = qs(&["q1"]);
        let judgements = JudgementSet {
            judgements: vec![Judgement {
                query_id: "q2".into(),
                doc_id: "d1".into(),
                grade: 2,
                note: None,
            }],
        };
        assert!(judgements.validate(&set).is_err());
    }

    #[test]
    fn judgement_set_rejects_out_of_range_grade() {
        let set = qs(&["q1"]);
        let judgements = JudgementSet {
            judgements: vec![Judgement {
                query_id: "q1".into(),
                doc_id: "d1".into(),
                grade: 4,
                note: None,
            }],
        };
        assert!(judgements.validate(&set).is_err());
    }

    #[test]
    fn grade_for_looks_up_pair() {
        let judgements = JudgementSet {
            judgements: vec![Judgement {
                query_id: "q1".into(),
                doc_id: "d1".into(),
                grade: 3,
                note: None,
            }],
        };
        assert_eq!(judgements.grade_for("q1", "d1"), Some(3));
        assert_eq!(judgements.grade_for("q1", "d2"), None);
    }
}
