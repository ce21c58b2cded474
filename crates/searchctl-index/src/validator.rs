//! The reindex validator: count, sample-query overlap, and
//! content-hash checks run before any alias switch.

use searchctl_core::{CtlError, CtlResult, Document, ValidationDefaults};
use searchctl_engine::EngineClient;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// One named check's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    /// Ids present in the target's top-K but absent from the source's, for
    /// the sample-query overlap check. Empty for every other check.
    #[serde(
        default,
        rename = "missingInSource",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub missing_in_source: Vec<uuid::Uuid>,
    /// Ids present in the source's top-K but absent from the target's, for
    /// the sample-query overlap check. Empty for every other check.
    #[serde(
        default,
        rename = "missingInTarget",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub missing_in_target: Vec<uuid::Uuid>,
}

/// Overall validator outcome: AND of every enabled check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    #[must_use]
    pub fn reasons(&self) -> String {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .flat_map(|c| c.reasons.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Runs the three independent reindex checks against a source/target pair.
pub struct ReindexValidator<'a> {
    engine: &'a dyn EngineClient,
}

impl<'a> ReindexValidator<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self { engine }
    }

    /// Run all enabled checks; `options` resolves request overrides against
    /// configured defaults.
    ///
    /// # Errors
    /// Propagates engine errors encountered while scanning or searching.
    pub async fn validate(
        &self,
        source: &str,
        target: &str,
        options: &ValidationDefaults,
    ) -> CtlResult<ValidationReport> {
        if !(0.0..=1.0).contains(&options.min_jaccard) {
            return Err(CtlError::BadRequest(
                "minJaccard must be within [0, 1]".into(),
            ));
        }

        let mut checks = Vec::new();

        if options.enable_count_validation {
            checks.push(self.count_check(source, target).await?);
        }
        if options.enable_sample_query_validation && !options.sample_queries.is_empty() {
            checks.push(
                self.sample_query_check(source, target, &options.sample_queries, options.sample_top_k, options.min_jaccard)
                    .await?,
            );
        }
        if options.enable_hash_validation {
            checks.push(
                self.content_hash_check(source, target, options.hash_max_docs, options.hash_page_size)
                    .await?,
            );
        }

        let passed = checks.iter().all(|c| c.passed);
        Ok(ValidationReport { passed, checks })
    }

    async fn count_check(&self, source: &str, target: &str) -> CtlResult<CheckResult> {
        let source_count = self.engine.count(source).await?;
        let target_count = self.engine.count(target).await?;
        let passed = source_count == target_count;
        let reasons = if passed {
            Vec::new()
        } else {
            vec![format!(
                "count mismatch: {source}={source_count}, {target}={target_count}"
            )]
        };
        Ok(CheckResult {
            name: "count".into(),
            passed,
            reasons,
            missing_in_source: Vec::new(),
            missing_in_target: Vec::new(),
        })
    }

    async fn sample_query_check(
        &self,
        source: &str,
        target: &str,
        sample_queries: &[String],
        top_k: usize,
        min_jaccard: f64,
    ) -> CtlResult<CheckResult> {
        let mut reasons = Vec::new();
        let mut missing_in_source = HashSet::new();
        let mut missing_in_target = HashSet::new();
        for query_text in sample_queries {
            let request = searchctl_query::SearchRequest {
                size: top_k,
                ..searchctl_query::SearchRequest::new(query_text.clone())
            };
            let body = searchctl_query::compose(&request);

            let source_result = self.engine.search(source, &body).await?;
            let target_result = self.engine.search(target, &body).await?;

            let source_ids: Vec<_> = source_result.hits.iter().map(|h| h.document.id).collect();
            let target_ids: Vec<_> = target_result.hits.iter().map(|h| h.document.id).collect();

            let similarity = shadow_compare(&source_ids, &target_ids);
            if similarity < min_jaccard {
                let source_set: HashSet<_> = source_ids.iter().copied().collect();
                let target_set: HashSet<_> = target_ids.iter().copied().collect();
                missing_in_target.extend(source_set.difference(&target_set).copied());
                missing_in_source.extend(target_set.difference(&source_set).copied());
                reasons.push(format!(
                    "sample query {query_text:?} Jaccard {similarity:.4} below threshold {min_jaccard:.4}"
                ));
            }
        }
        Ok(CheckResult {
            name: "sample_query_overlap".into(),
            passed: reasons.is_empty(),
            reasons,
            missing_in_source: missing_in_source.into_iter().collect(),
            missing_in_target: missing_in_target.into_iter().collect(),
        })
    }

    async fn content_hash_check(
        &self,
        source: &str,
        target: &str,
        max_docs: usize,
        page_size: usize,
    ) -> CtlResult<CheckResult> {
        let (source_hash, source_scanned) = self.hash_index(source, max_docs, page_size).await?;
        let (target_hash, target_scanned) = self.hash_index(target, max_docs, page_size).await?;

        let passed = source_hash == target_hash && source_scanned == target_scanned;
        let reasons = if passed {
            Vec::new()
        } else {
            vec![format!(
                "content hash mismatch: {source} ({source_scanned} docs, {source_hash}) vs {target} ({target_scanned} docs, {target_hash})"
            )]
        };
        Ok(CheckResult {
            name: "content_hash".into(),
            passed,
            reasons,
            missing_in_source: Vec::new(),
            missing_in_target: Vec::new(),
        })
    }

    async fn hash_index(
        &self,
        index: &str,
        max_docs: usize,
        page_size: usize,
    ) -> CtlResult<(String, usize)> {
        let mut hasher = Sha256::new();
        let mut scanned = 0usize;
        let mut from = 0usize;

        while scanned < max_docs {
            let page_size = page_size.min(max_docs - scanned).max(1);
            let page: Vec<Document> = self.engine.scan(index, from, page_size).await?;
            if page.is_empty() {
                break;
            }
            for doc in &page {
                hasher.update(doc.hash_line().as_bytes());
                hasher.update(b"\n");
            }
            scanned += page.len();
            from += page.len();
            if page.len() < page_size {
                break;
            }
        }

        Ok((hex::encode(hasher.finalize()), scanned))
    }
}

/// Jaccard overlap between two ranked id lists, ignoring order.
///
/// Used by the sample-query check to compare source/target top-K result
/// sets; exposed standalone so other shadow/rollout comparisons can reuse
/// the same overlap computation instead of re-deriving it.
#[must_use]
pub fn shadow_compare(a: &[uuid::Uuid], b: &[uuid::Uuid]) -> f64 {
    let a: HashSet<_> = a.iter().collect();
    let b: HashSet<_> = b.iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = a.intersection(&b).count();
    intersection as f64 / union as f64
}
