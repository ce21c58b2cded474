//! Wire-level request/response types for the Engine Port.

use searchctl_core::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single bulk-index operation: upsert `doc` under `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkIndexOp {
    pub id: Uuid,
    pub doc: Document,
}

/// Per-item outcome of a bulk submission, in the same order as the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemOutcome {
    pub id: Uuid,
    /// HTTP-like status code reported by the engine for this item.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItemOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < 300
    }
}

/// Outcome of a single `reindex(source, target)` engine call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReindexOutcome {
    pub took_ms: u64,
    /// Per-document failure reasons reported by the engine during the copy.
    pub failures: Vec<String>,
}

/// One hit within an engine [`SearchResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub highlights: HashMap<String, Vec<String>>,
}

/// The result of an engine `search` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub total: u64,
    pub took_ms: u64,
    pub hits: Vec<SearchHit>,
}

/// A single alias-update action. The Alias Manager always submits these in
/// batches of four (remove read, remove write, add read, add write) via a
/// single atomic `update_aliases` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AliasAction {
    /// Remove `alias` from whichever index(es) currently carry it.
    RemoveFromAny { alias: String },
    /// Bind `alias` to `index`. `is_write_index` marks the engine's
    /// single-writer flag for the write alias.
    Add {
        alias: String,
        index: String,
        is_write_index: bool,
    },
}

/// The two aliases the control plane maintains.
pub const READ_ALIAS: &str = "docs_read";
pub const WRITE_ALIAS: &str = "docs_write";
