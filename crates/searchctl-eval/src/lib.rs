//! Evaluation running, IR metric calculation, report writing/comparison, and
//! performance benchmarking.

pub mod benchmark;
pub mod metrics;
pub mod report;
pub mod runner;

pub use benchmark::{
    BenchmarkResult, LatencyStats, PerformanceComparator, PerformanceComparisonReport,
    PerformanceBenchmarker, QueryPerformance,
};
pub use metrics::{compute_query_metrics, summarize, EvaluationSummary, JudgedHit, QueryMetrics};
pub use report::{
    ComparisonReport, MetricsReport, ReportComparator, ReportWriter, WorstQueryChangeKind,
    WorstQueryEntry,
};
pub use runner::{EvaluationRunResult, EvaluationRunner, HitRecord, QueryResult};
