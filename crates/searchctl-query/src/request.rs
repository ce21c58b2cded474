//! [`SearchRequest`]: the pure input to the query composer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relevance-vs-recency-vs-popularity ordering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortMode {
    #[default]
    Relevance,
    Recency,
    Popularity,
}

/// `multi_match` query type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MultiMatchType {
    #[default]
    BestFields,
    MostFields,
    CrossFields,
}

impl MultiMatchType {
    /// The wire string the engine expects (`best_fields`, etc).
    #[must_use]
    pub const fn wire(self) -> &'static str {
        match self {
            Self::BestFields => "best_fields",
            Self::MostFields => "most_fields",
            Self::CrossFields => "cross_fields",
        }
    }
}

/// How popularity contributes to scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PopularityMode {
    RankFeature,
    FieldValueFactor,
}

/// Tuning knobs for recency decay and popularity boosting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecencyTuning {
    pub enabled: bool,
    /// Gaussian decay scale, e.g. `"30d"`.
    pub scale: String,
    /// Decay factor at `scale`, in `[0, 1]`.
    pub decay: f64,
    pub weight: f64,
}

impl Default for RecencyTuning {
    fn default() -> Self {
        Self {
            enabled: false,
            scale: "30d".into(),
            decay: 0.5,
            weight: 1.0,
        }
    }
}

/// Popularity tuning. `pivot`/`boost` apply to [`PopularityMode::RankFeature`];
/// `factor`/`modifier`/`missing` apply to [`PopularityMode::FieldValueFactor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularityTuning {
    pub enabled: bool,
    pub mode: PopularityMode,
    pub pivot: f64,
    pub boost: f64,
    pub factor: f64,
    pub modifier: Option<String>,
    pub missing: f64,
    pub weight: f64,
}

impl Default for PopularityTuning {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: PopularityMode::FieldValueFactor,
            pivot: 10.0,
            boost: 1.0,
            factor: 1.0,
            modifier: Some("log1p".into()),
            missing: 0.0,
            weight: 1.0,
        }
    }
}

/// Score/boost combination modes, default `SUM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    #[default]
    Sum,
    Avg,
    Max,
    Min,
    Multiply,
}

impl CombineMode {
    #[must_use]
    pub const fn wire(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
            Self::Multiply => "multiply",
        }
    }
}

/// Full ranking tuning bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingTuning {
    #[serde(default)]
    pub recency: RecencyTuning,
    #[serde(default)]
    pub popularity: PopularityTuning,
    #[serde(default)]
    pub score_mode: CombineMode,
    #[serde(default)]
    pub boost_mode: CombineMode,
}

/// The structured input to [`crate::compose::compose`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default)]
    pub multi_match_type: MultiMatchType,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default)]
    pub target_index: Option<String>,
    #[serde(default)]
    pub ranking_tuning: RankingTuning,
}

const fn default_size() -> usize {
    20
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            tags: Vec::new(),
            author: None,
            published_from: None,
            published_to: None,
            sort: SortMode::default(),
            multi_match_type: MultiMatchType::default(),
            page: 0,
            size: default_size(),
            target_index: None,
            ranking_tuning: RankingTuning::default(),
        }
    }

    /// `from = page * size`.
    #[must_use]
    pub const fn from_offset(&self) -> usize {
        self.page * self.size
    }
}
