//! The performance benchmarker: per-query and pooled latency
//! statistics over repeated searches, plus a baseline comparator.

use chrono::{DateTime, Utc};
use searchctl_core::{CtlError, CtlResult, QuerySet};
use searchctl_engine::EngineClient;
use searchctl_query::{compose, SearchRequest};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// Min/P50/P95/max/avg over a sample set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
    pub avg: f64,
}

/// `index = clamp(ceil(p * n) - 1, 0, n - 1)` on the ascending sample list.
fn percentile(sorted_samples: &[u64], p: f64) -> f64 {
    let n = sorted_samples.len();
    if n == 0 {
        return 0.0;
    }
    let raw_index = (p * n as f64).ceil() as i64 - 1;
    let index = raw_index.clamp(0, n as i64 - 1) as usize;
    sorted_samples[index] as f64
}

fn compute_stats(samples: &[u64]) -> LatencyStats {
    if samples.is_empty() {
        return LatencyStats::default();
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let avg = samples.iter().sum::<u64>() as f64 / samples.len() as f64;
    LatencyStats {
        min: *sorted.first().unwrap() as f64,
        p50: percentile(&sorted, 0.50),
        p95: percentile(&sorted, 0.95),
        max: *sorted.last().unwrap() as f64,
        avg,
    }
}

/// Per-query latency stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPerformance {
    #[serde(rename = "queryId")]
    pub query_id: String,
    pub stats: LatencyStats,
}

/// Full benchmark run result, persisted as `metrics.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "datasetId")]
    pub dataset_id: String,
    #[serde(rename = "topK")]
    pub top_k: usize,
    pub iterations: u32,
    pub warmups: u32,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub qps: f64,
    pub global: LatencyStats,
    #[serde(rename = "perQuery")]
    pub per_query: Vec<QueryPerformance>,
}

/// Runs repeated searches over a query set, collecting latency samples.
pub struct PerformanceBenchmarker<'a> {
    engine: &'a dyn EngineClient,
    reports_dir: PathBuf,
}

impl<'a> PerformanceBenchmarker<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn EngineClient, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            reports_dir: reports_dir.into(),
        }
    }

    /// # Errors
    /// Returns `BadRequest` if the query set is empty, or propagates engine
    /// search failures.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        dataset_id: &str,
        query_set: &QuerySet,
        top_k: usize,
        iterations: u32,
        warmups: u32,
        target_index: Option<&str>,
        report_id_prefix: &str,
    ) -> CtlResult<BenchmarkResult> {
        if query_set.is_empty() {
            return Err(CtlError::BadRequest("query set must be non-empty for benchmarking".into()));
        }

        let target = target_index.unwrap_or(searchctl_engine::READ_ALIAS);
        let started_at = Utc::now();
        let wall_clock_start = Instant::now();

        let mut per_query = Vec::with_capacity(query_set.len());
        let mut pooled: Vec<u64> = Vec::new();

        for query in &query_set.queries {
            let mut request = SearchRequest::new(query.query_text.clone());
            request.size = top_k;
            let body = compose(&request);

            for _ in 0..warmups {
                self.engine
                    .search(target, &body)
                    .await
                    .map_err(|e| CtlError::engine(format!("bench-warmup:{}", query.query_id), e.to_string()))?;
            }

            let mut samples = Vec::with_capacity(iterations as usize);
            for _ in 0..iterations {
                let result = self
                    .engine
                    .search(target, &body)
                    .await
                    .map_err(|e| CtlError::engine(format!("bench:{}", query.query_id), e.to_string()))?;
                samples.push(result.took_ms);
            }

            pooled.extend_from_slice(&samples);
            per_query.push(QueryPerformance {
                query_id: query.query_id.clone(),
                stats: compute_stats(&samples),
            });
        }

        let completed_at = Utc::now();
        let elapsed = wall_clock_start.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let total_samples = pooled.len();
        let qps = if elapsed.as_secs_f64() > 0.0 {
            total_samples as f64 / elapsed.as_secs_f64()
        } else {
            total_samples as f64
        };

        let run_id = format!("{report_id_prefix}_{dataset_id}_{}", started_at.format("%Y%m%d_%H%M%S"));

        let result = BenchmarkResult {
            run_id,
            dataset_id: dataset_id.to_string(),
            top_k,
            iterations,
            warmups,
            started_at,
            completed_at,
            elapsed_ms,
            qps,
            global: compute_stats(&pooled),
            per_query,
        };

        self.write(&result)?;
        Ok(result)
    }

    fn write(&self, result: &BenchmarkResult) -> CtlResult<()> {
        let dir = self.reports_dir.join("performance").join(&result.run_id);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("metrics.json"), serde_json::to_string_pretty(result)?)?;
        std::fs::write(dir.join("summary.md"), render_summary_markdown(result))?;
        Ok(())
    }
}

fn render_summary_markdown(result: &BenchmarkResult) -> String {
    let mut out = format!(
        "# Performance run {}\n\n\
        - dataset: {}\n- topK: {}\n- iterations: {}\n- warmups: {}\n- QPS: {:.2}\n\n\
        ## Global latency (ms)\n\n\
        | min | P50 | P95 | max | avg |\n|---|---|---|---|---|\n\
        | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n\n\
        ## Per-query latency (ms)\n\n\
        | queryId | min | P50 | P95 | max | avg |\n|---|---|---|---|---|---|\n",
        result.run_id,
        result.dataset_id,
        result.top_k,
        result.iterations,
        result.warmups,
        result.qps,
        result.global.min,
        result.global.p50,
        result.global.p95,
        result.global.max,
        result.global.avg,
    );
    for q in &result.per_query {
        out.push_str(&format!(
            "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
            q.query_id, q.stats.min, q.stats.p50, q.stats.p95, q.stats.max, q.stats.avg
        ));
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetricDelta {
    pub name: String,
    pub before: f64,
    pub after: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPerformanceDelta {
    #[serde(rename = "queryId")]
    pub query_id: String,
    #[serde(rename = "deltaP95")]
    pub delta_p95: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceComparisonReport {
    #[serde(rename = "beforeRunId")]
    pub before_run_id: String,
    #[serde(rename = "afterRunId")]
    pub after_run_id: String,
    pub deltas: Vec<PerformanceMetricDelta>,
    pub regressions: Vec<QueryPerformanceDelta>,
    pub improvements: Vec<QueryPerformanceDelta>,
}

/// Compares a performance run against a prior baseline run.
pub struct PerformanceComparator {
    reports_dir: PathBuf,
}

impl PerformanceComparator {
    #[must_use]
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    fn load(&self, run_id: &str) -> CtlResult<BenchmarkResult> {
        let path = self.reports_dir.join("performance").join(run_id).join("metrics.json");
        let raw = std::fs::read_to_string(&path)
            .map_err(|_| CtlError::NotFound(format!("performance run not found: {run_id}")))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// # Errors
    /// Returns `NotFound` if either run is missing.
    pub fn compare(&self, before_run_id: &str, after_run_id: &str, top_n: usize) -> CtlResult<PerformanceComparisonReport> {
        let before = self.load(before_run_id)?;
        let after = self.load(after_run_id)?;

        let deltas = vec![
            PerformanceMetricDelta {
                name: "P95".into(),
                before: before.global.p95,
                after: after.global.p95,
                delta: after.global.p95 - before.global.p95,
            },
            PerformanceMetricDelta {
                name: "QPS".into(),
                before: before.qps,
                after: after.qps,
                delta: after.qps - before.qps,
            },
        ];

        let mut per_query: Vec<QueryPerformanceDelta> = after
            .per_query
            .iter()
            .filter_map(|a| {
                before
                    .per_query
                    .iter()
                    .find(|b| b.query_id == a.query_id)
                    .map(|b| QueryPerformanceDelta {
                        query_id: a.query_id.clone(),
                        delta_p95: a.stats.p95 - b.stats.p95,
                    })
            })
            .collect();
        per_query.sort_by(|a, b| b.delta_p95.abs().partial_cmp(&a.delta_p95.abs()).unwrap_or(std::cmp::Ordering::Equal));

        let regressions: Vec<QueryPerformanceDelta> = per_query.iter().filter(|d| d.delta_p95 > 0.0).take(top_n).cloned().collect();
        let improvements: Vec<QueryPerformanceDelta> = per_query.iter().filter(|d| d.delta_p95 < 0.0).take(top_n).cloned().collect();

        let report = PerformanceComparisonReport {
            before_run_id: before_run_id.to_string(),
            after_run_id: after_run_id.to_string(),
            deltas,
            regressions,
            improvements,
        };
        self.write_markdown(&report)?;
        Ok(report)
    }

    fn write_markdown(&self, report: &PerformanceComparisonReport) -> CtlResult<()> {
        let dir = self.reports_dir.join("performance").join("comparisons");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}_vs_{}.md", report.after_run_id, report.before_run_id));

        let mut body = format!(
            "# Performance comparison: {} vs {}\n\n## Deltas\n\n| Metric | Before | After | Delta |\n|---|---|---|---|\n",
            report.after_run_id, report.before_run_id
        );
        for d in &report.deltas {
            body.push_str(&format!("| {} | {:.2} | {:.2} | {:.2} |\n", d.name, d.before, d.after, d.delta));
        }
        body.push_str("\n## Regressions (by |delta P95|)\n\n| queryId | delta P95 |\n|---|---|\n");
        for d in &report.regressions {
            body.push_str(&format!("| {} | {:.2} |\n", d.query_id, d.delta_p95));
        }
        body.push_str("\n## Improvements (by |delta P95|)\n\n| queryId | delta P95 |\n|---|---|\n");
        for d in &report.improvements {
            body.push_str(&format!("| {} | {:.2} |\n", d.query_id, d.delta_p95));
        }

        std::fs::write(path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchctl_core::EvalQuery;
    use searchctl_engine::InMemoryEngine;

    fn query_set() -> QuerySet {
        QuerySet {
            queries: vec![EvalQuery {
                query_id: "q1".into(),
                query_text: "rust".into(),
                intent: "informational".into(),
                filters: None,
            }],
        }
    }

    #[test]
    fn percentile_matches_formula_for_small_set() {
        let samples = vec![10, 20, 30, 40];
        assert!((percentile(&samples, 0.50) - 20.0).abs() < f64::EPSILON);
        assert!((percentile(&samples, 0.95) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 0.95), 0.0);
    }

    #[tokio::test]
    async fn run_rejects_empty_queryset() {
        let engine = InMemoryEngine::new();
        let tmp = tempfile::tempdir().unwrap();
        let bench = PerformanceBenchmarker::new(&engine, tmp.path());
        let empty = QuerySet { queries: vec![] };
        let result = bench.run("demo", &empty, 10, 3, 0, None, "bench").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn run_collects_samples_and_writes_report() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let bench = PerformanceBenchmarker::new(&engine, tmp.path());

        let result = bench.run("demo", &query_set(), 10, 3, 1, Some("docs_v1"), "bench").await.unwrap();
        assert_eq!(result.per_query.len(), 1);
        assert_eq!(result.per_query[0].stats.max, result.global.max);

        let metrics_path = tmp.path().join("performance").join(&result.run_id).join("metrics.json");
        assert!(metrics_path.exists());
    }

    #[test]
    fn comparator_errors_on_missing_run() {
        let tmp = tempfile::tempdir().unwrap();
        let comparator = PerformanceComparator::new(tmp.path());
        assert!(comparator.compare("missing1", "missing2", 5).is_err());
    }
}
