//! The bulk indexer: chunked, partial-failure-aware batch writer
//! with bounded retry on the set of still-failing items.

use searchctl_core::{CtlResult, Document};
use searchctl_engine::{BulkIndexOp, EngineClient, WRITE_ALIAS};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// A single document's final failure after retries are exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub status: u16,
    pub reason: String,
    pub attempt: u32,
}

/// Outcome of a [`BulkIndexer::index`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
    pub attempts: u32,
    pub took_ms: u64,
}

/// Chunked bulk indexer.
pub struct BulkIndexer<'a> {
    engine: &'a dyn EngineClient,
    chunk_size: usize,
    max_retries: u32,
}

impl<'a> BulkIndexer<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn EngineClient, chunk_size: usize, max_retries: u32) -> Self {
        Self {
            engine,
            chunk_size,
            max_retries,
        }
    }

    /// Index `documents` against `target` (defaults to the write alias),
    /// splitting into chunks and retrying only the items that fail, up to
    /// `max_retries` passes.
    ///
    /// # Errors
    /// Only propagates errors unrelated to per-item failures (none today —
    /// transport failures degrade a chunk's items to retry candidates
    /// instead of aborting the whole call.
    pub async fn index(
        &self,
        documents: Vec<Document>,
        target: Option<&str>,
        tag: &str,
    ) -> CtlResult<BulkResult> {
        let target = target.unwrap_or(WRITE_ALIAS);
        let started = Instant::now();
        let total = documents.len();

        let mut pending: Vec<BulkIndexOp> = documents
            .into_iter()
            .map(|doc| BulkIndexOp { id: doc.id, doc })
            .collect();
        let mut successful: usize = 0;
        let mut last_failures: Vec<BulkFailure>;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let mut round_failures: Vec<BulkFailure> = Vec::new();

            for chunk in pending.chunks(self.chunk_size.max(1)) {
                match self.engine.bulk(target, chunk).await {
                    Ok(outcomes) => {
                        for (op, outcome) in chunk.iter().zip(outcomes.iter()) {
                            if outcome.is_success() {
                                successful += 1;
                            } else {
                                round_failures.push(BulkFailure {
                                    id: op.id,
                                    status: outcome.status,
                                    reason: outcome
                                        .error
                                        .clone()
                                        .unwrap_or_else(|| "unknown engine error".into()),
                                    attempt,
                                });
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(target = tag, attempt, error = %err, "bulk chunk transport failure");
                        for op in chunk {
                            round_failures.push(BulkFailure {
                                id: op.id,
                                status: 0,
                                reason: err.to_string(),
                                attempt,
                            });
                        }
                    }
                }
            }

            last_failures = round_failures;
            if last_failures.is_empty() || attempt > self.max_retries {
                break;
            }

            let failing_ids: std::collections::HashSet<Uuid> =
                last_failures.iter().map(|f| f.id).collect();
            pending.retain(|op| failing_ids.contains(&op.id));
        }

        let failed = last_failures.len();
        Ok(BulkResult {
            total,
            success: successful,
            failed,
            failures: last_failures,
            attempts: attempt,
            took_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use searchctl_engine::InMemoryEngine;

    fn doc() -> Document {
        Document::new(
            Uuid::new_v4(),
            "t",
            None,
            "b",
            vec![],
            "c",
            "a",
            Utc::now(),
            1.0,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn success_total_equals_sum() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
        let indexer = BulkIndexer::new(&engine, 500, 2);
        let docs = vec![doc(), doc(), doc()];
        let result = indexer.index(docs, Some("docs_v1"), "test").await.unwrap();
        assert_eq!(result.success + result.failed, result.total);
        assert_eq!(result.success, 3);
        assert_eq!(result.failed, 0);
    }

    #[tokio::test]
    async fn chunking_splits_into_multiple_batches() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
        let indexer = BulkIndexer::new(&engine, 2, 2);
        let docs: Vec<Document> = (0..5).map(|_| doc()).collect();
        let result = indexer.index(docs, Some("docs_v1"), "test").await.unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.success, 5);
    }

    #[tokio::test]
    async fn attempts_never_exceed_max_retries_plus_one() {
        let engine = InMemoryEngine::new();
        // No index created: every bulk() call resolves target via alias
        // lookup fallback to raw name, creating docs lazily is not possible —
        // instead force failures by pointing at a target with no backing
        // index and asserting the retry loop still terminates.
        let indexer = BulkIndexer::new(&engine, 500, 2);
        let docs = vec![doc()];
        let result = indexer.index(docs, Some("missing_index"), "test").await.unwrap();
        assert!(result.attempts <= 3);
        for failure in &result.failures {
            assert!(failure.attempt <= result.attempts);
        }
    }
}
