//! The query composition layer: a pure function from [`SearchRequest`] to the
//! engine's native scoring tree.

pub mod compose;
pub mod request;
pub mod suggest;

pub use compose::compose;
pub use request::{
    CombineMode, MultiMatchType, PopularityMode, PopularityTuning, RankingTuning, RecencyTuning,
    SearchRequest, SortMode,
};
pub use suggest::{compose_suggest, SuggestRequest};
