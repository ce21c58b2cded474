//! Process configuration.
//!
//! A single [`Config`] value is constructed once at startup (env vars plus an
//! optional JSON5 file) and passed by value/reference into every component
//! constructor. No component reads environment variables directly.

use crate::error::CtlResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults for the reindex validator, overridable per-request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDefaults {
    #[serde(default = "default_true")]
    pub enable_count_validation: bool,
    #[serde(default = "default_true")]
    pub enable_sample_query_validation: bool,
    #[serde(default = "default_true")]
    pub enable_hash_validation: bool,
    #[serde(default)]
    pub sample_queries: Vec<String>,
    #[serde(default = "default_sample_top_k")]
    pub sample_top_k: usize,
    #[serde(default = "default_min_jaccard")]
    pub min_jaccard: f64,
    #[serde(default = "default_hash_max_docs")]
    pub hash_max_docs: usize,
    #[serde(default = "default_hash_page_size")]
    pub hash_page_size: usize,
}

const fn default_true() -> bool {
    true
}
const fn default_sample_top_k() -> usize {
    20
}
const fn default_min_jaccard() -> f64 {
    0.6
}
const fn default_hash_max_docs() -> usize {
    10_000
}
const fn default_hash_page_size() -> usize {
    500
}

impl Default for ValidationDefaults {
    fn default() -> Self {
        Self {
            enable_count_validation: true,
            enable_sample_query_validation: true,
            enable_hash_validation: true,
            sample_queries: Vec::new(),
            sample_top_k: default_sample_top_k(),
            min_jaccard: default_min_jaccard(),
            hash_max_docs: default_hash_max_docs(),
            hash_page_size: default_hash_page_size(),
        }
    }
}

/// Defaults for the bulk indexer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIndexerDefaults {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_chunk_size() -> usize {
    500
}
const fn default_max_retries() -> u32 {
    2
}

impl Default for BulkIndexerDefaults {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
        }
    }
}

/// Defaults for the performance benchmarker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BenchmarkDefaults {
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default)]
    pub warmups: u32,
}

const fn default_iterations() -> u32 {
    20
}

impl Default for BenchmarkDefaults {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            warmups: 3,
        }
    }
}

/// Top-level process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the engine's REST API (e.g. `http://localhost:9200`).
    pub engine_base_url: String,
    /// Directory under which `reports/` is created (process working directory
    /// by default).
    pub report_base_path: PathBuf,
    /// Directory containing `docs/eval/querysets` and `docs/eval/judgements`.
    pub dataset_base_path: PathBuf,
    /// Path to the JSON index template used on `create_index`.
    pub index_template_path: PathBuf,
    #[serde(default)]
    pub validation: ValidationDefaults,
    #[serde(default)]
    pub bulk_indexer: BulkIndexerDefaults,
    #[serde(default)]
    pub benchmark: BenchmarkDefaults,
    /// Number of worst queries to surface in a report, default 10.
    #[serde(default = "default_worst_queries")]
    pub worst_queries_count: usize,
}

const fn default_worst_queries() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_base_url: "http://localhost:9200".into(),
            report_base_path: PathBuf::from("."),
            dataset_base_path: PathBuf::from("."),
            index_template_path: PathBuf::from("docs/index_template.json"),
            validation: ValidationDefaults::default(),
            bulk_indexer: BulkIndexerDefaults::default(),
            benchmark: BenchmarkDefaults::default(),
            worst_queries_count: default_worst_queries(),
        }
    }
}

impl Config {
    /// Load from a JSON5 file, falling back to defaults overridden by
    /// environment variables (`SEARCHCTL_ENGINE_URL`, `SEARCHCTL_REPORT_PATH`,
    /// `SEARCHCTL_DATASET_PATH`).
    ///
    /// # Errors
    /// Returns [`crate::error::CtlError`] if the file exists but fails to parse.
    pub fn load(path: Option<&Path>) -> CtlResult<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                json5::from_str(&raw)
                    .map_err(|e| crate::error::CtlError::BadRequest(format!("invalid config: {e}")))?
            }
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("SEARCHCTL_ENGINE_URL") {
            config.engine_base_url = url;
        }
        if let Ok(path) = std::env::var("SEARCHCTL_REPORT_PATH") {
            config.report_base_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("SEARCHCTL_DATASET_PATH") {
            config.dataset_base_path = PathBuf::from(path);
        }
        Ok(config)
    }

    #[must_use]
    pub fn reports_dir(&self) -> PathBuf {
        self.report_base_path.join("reports")
    }

    #[must_use]
    pub fn queryset_path(&self, dataset_id: &str) -> PathBuf {
        self.dataset_base_path
            .join("docs/eval/querysets")
            .join(format!("{dataset_id}_queries.json"))
    }

    #[must_use]
    pub fn judgements_path(&self, dataset_id: &str) -> PathBuf {
        self.dataset_base_path
            .join("docs/eval/judgements")
            .join(format!("{dataset_id}_judgements.json"))
    }
}
