//! Domain model, configuration, and error types shared by the search control
//! plane.

pub mod alias;
pub mod config;
pub mod dataset;
pub mod document;
pub mod error;

pub use alias::AliasState;
pub use config::{BenchmarkDefaults, BulkIndexerDefaults, Config, ValidationDefaults};
pub use dataset::{EvalQuery, Grade, Judgement, JudgementSet, QueryFilters, QuerySet};
pub use document::{Document, Generation};
pub use error::{CtlError, CtlResult, ErrorKind};
