//! The abstract Engine Port.
//!
//! All engine interaction in the control plane goes through this trait.
//! Implementations wrap a concrete search engine's wire protocol (see
//! [`crate::rest::RestEngineClient`] for the production REST client) or, in
//! tests, an in-memory double (see [`crate::testing::InMemoryEngine`]).

use crate::model::{AliasAction, BulkIndexOp, BulkItemOutcome, ReindexOutcome, SearchResult};
use async_trait::async_trait;
use searchctl_core::{CtlResult, Document};
use serde_json::Value;

/// Operations the control plane requires of the search engine.
///
/// `target` parameters on [`EngineClient::bulk`] and [`EngineClient::search`]
/// may be an alias or a concrete index name — the port does not distinguish.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Create `name` from `template`. Fails if the index already exists.
    async fn create_index(&self, name: &str, template: &Value) -> CtlResult<()>;

    /// Whether `name` currently exists.
    async fn index_exists(&self, name: &str) -> CtlResult<bool>;

    /// Delete `name`. No-op error semantics are engine-specific.
    async fn delete_index(&self, name: &str) -> CtlResult<()>;

    /// Document count of `index`.
    async fn count(&self, index: &str) -> CtlResult<u64>;

    /// Scan a page of documents. Implementations **must** sort ascending by
    /// document id so pagination is deterministic (content-hash check relies
    /// on this ordering.
    async fn scan(&self, index: &str, from: usize, size: usize) -> CtlResult<Vec<Document>>;

    /// Execute a composed query body against `target` and return ranked hits.
    async fn search(&self, target: &str, body: &Value) -> CtlResult<SearchResult>;

    /// Submit a batch of index operations against `target`, preserving
    /// per-item order in the returned outcomes.
    async fn bulk(&self, target: &str, ops: &[BulkIndexOp]) -> CtlResult<Vec<BulkItemOutcome>>;

    /// Copy all documents from `source` into `target` on the engine side.
    async fn reindex(
        &self,
        source: &str,
        target: &str,
        wait_for_completion: bool,
        refresh: bool,
    ) -> CtlResult<ReindexOutcome>;

    /// Apply `actions` as a single atomic alias-update transaction.
    async fn update_aliases(&self, actions: &[AliasAction]) -> CtlResult<()>;

    /// The index names currently bound to `alias`, empty if none.
    async fn alias_targets(&self, alias: &str) -> CtlResult<Vec<String>>;

    /// Force a refresh of `index` so recently-written documents are
    /// immediately searchable.
    async fn refresh(&self, index: &str) -> CtlResult<()>;
}
