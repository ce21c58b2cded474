//! The report writer and comparator: persists evaluation runs
//! and diffs two prior reports.

use crate::metrics::EvaluationSummary;
use crate::runner::EvaluationRunResult;
use searchctl_core::{CtlError, CtlResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One query's entry in the worst-queries table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorstQueryEntry {
    #[serde(rename = "queryId")]
    pub query_id: String,
    pub intent: String,
    #[serde(rename = "precisionAtK")]
    pub precision_at_k: f64,
    #[serde(rename = "recallAtK")]
    pub recall_at_k: f64,
    pub mrr: f64,
    #[serde(rename = "ndcgAtK")]
    pub ndcg_at_k: f64,
    #[serde(rename = "judgedHits")]
    pub judged_hits: usize,
    #[serde(rename = "relevantHits")]
    pub relevant_hits: usize,
    #[serde(rename = "totalHits")]
    pub total_hits: usize,
}

/// The exact `metrics.json` schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    #[serde(rename = "reportId")]
    pub report_id: String,
    #[serde(rename = "datasetId")]
    pub dataset_id: String,
    #[serde(rename = "topK")]
    pub top_k: usize,
    #[serde(rename = "totalQueries")]
    pub total_queries: usize,
    #[serde(rename = "startedAt")]
    pub started_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "completedAt")]
    pub completed_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub summary: EvaluationSummary,
    #[serde(rename = "worstQueries")]
    pub worst_queries: Vec<WorstQueryEntry>,
}

/// Writes `reports/{reportId}/{metrics.json, summary.md}`.
pub struct ReportWriter {
    reports_dir: PathBuf,
}

impl ReportWriter {
    #[must_use]
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Write a report for `run`, keeping the `worst_queries_count` lowest
    /// nDCG@K queries (ties broken by ascending Recall@K).
    ///
    /// # Errors
    /// Propagates filesystem and serialization failures.
    pub fn write(&self, run: &EvaluationRunResult, worst_queries_count: usize, report_id_prefix: Option<&str>) -> CtlResult<PathBuf> {
        let stamp = run.started_at.format("%Y%m%d_%H%M%S");
        let report_id = match report_id_prefix {
            Some(prefix) => format!("{prefix}_{stamp}"),
            None => stamp.to_string(),
        };

        let mut worst: Vec<WorstQueryEntry> = run
            .results
            .iter()
            .map(|r| WorstQueryEntry {
                query_id: r.query_id.clone(),
                intent: r.intent.clone(),
                precision_at_k: r.metrics.precision_at_k,
                recall_at_k: r.metrics.recall_at_k,
                mrr: r.metrics.mrr,
                ndcg_at_k: r.metrics.ndcg_at_k,
                judged_hits: r.metrics.judged_hits,
                relevant_hits: r.metrics.relevant_hits,
                total_hits: r.metrics.total_hits,
            })
            .collect();
        worst.sort_by(|a, b| {
            a.ndcg_at_k
                .partial_cmp(&b.ndcg_at_k)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.recall_at_k.partial_cmp(&b.recall_at_k).unwrap_or(std::cmp::Ordering::Equal))
        });
        worst.truncate(worst_queries_count.max(1));

        let report = MetricsReport {
            report_id: report_id.clone(),
            dataset_id: run.dataset_id.clone(),
            top_k: run.top_k,
            total_queries: run.results.len(),
            started_at: run.started_at,
            completed_at: run.completed_at,
            elapsed_ms: run.elapsed_ms,
            summary: run.summary,
            worst_queries: worst,
        };

        let dir = self.reports_dir.join(&report_id);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("metrics.json"), serde_json::to_string_pretty(&report)?)?;
        std::fs::write(dir.join("summary.md"), render_summary_markdown(&report))?;

        Ok(dir)
    }
}

fn render_summary_markdown(report: &MetricsReport) -> String {
    let mut out = format!(
        "# Evaluation report {}\n\n\
        - dataset: {}\n\
        - topK: {}\n\
        - total queries: {}\n\
        - elapsed: {} ms\n\n\
        ## Summary\n\n\
        | Metric | Value |\n|---|---|\n\
        | Precision@K | {:.4} |\n\
        | Recall@K | {:.4} |\n\
        | MRR | {:.4} |\n\
        | nDCG@K | {:.4} |\n\n\
        ## Worst queries\n\n\
        | queryId | intent | Precision@K | Recall@K | MRR | nDCG@K |\n|---|---|---|---|---|---|\n",
        report.report_id,
        report.dataset_id,
        report.top_k,
        report.total_queries,
        report.elapsed_ms,
        report.summary.mean_precision_at_k,
        report.summary.mean_recall_at_k,
        report.summary.mean_mrr,
        report.summary.mean_ndcg_at_k,
    );
    for q in &report.worst_queries {
        out.push_str(&format!(
            "| {} | {} | {:.4} | {:.4} | {:.4} | {:.4} |\n",
            q.query_id, q.intent, q.precision_at_k, q.recall_at_k, q.mrr, q.ndcg_at_k
        ));
    }
    out
}

/// Classification of a worst-query's change between two reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorstQueryChangeKind {
    Improved,
    Regressed,
    Unchanged,
    RemovedFromWorst,
    NewInWorst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorstQueryChange {
    #[serde(rename = "queryId")]
    pub query_id: String,
    pub kind: WorstQueryChangeKind,
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDelta {
    pub name: String,
    pub before: f64,
    pub after: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    #[serde(rename = "beforeReportId")]
    pub before_report_id: String,
    #[serde(rename = "afterReportId")]
    pub after_report_id: String,
    #[serde(rename = "metricsDelta")]
    pub metrics_delta: Vec<MetricDelta>,
    #[serde(rename = "worstQueryChanges")]
    pub worst_query_changes: Vec<WorstQueryChange>,
}

/// Loads two `metrics.json` reports and diffs their summaries/worst queries.
pub struct ReportComparator {
    reports_dir: PathBuf,
}

impl ReportComparator {
    #[must_use]
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    fn load(&self, report_id: &str) -> CtlResult<MetricsReport> {
        let path = self.reports_dir.join(report_id).join("metrics.json");
        let raw = std::fs::read_to_string(&path)
            .map_err(|_| CtlError::NotFound(format!("report not found: {report_id}")))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Compare `before` against `after`, writing
    /// `reports/comparisons/{after}_vs_{before}.md`.
    ///
    /// # Errors
    /// Returns `NotFound` if either report is missing.
    pub fn compare(&self, before_report_id: &str, after_report_id: &str, top_n: usize) -> CtlResult<ComparisonReport> {
        let before = self.load(before_report_id)?;
        let after = self.load(after_report_id)?;

        let metrics_delta = vec![
            metric_delta("Precision@K", before.summary.mean_precision_at_k, after.summary.mean_precision_at_k),
            metric_delta("Recall@K", before.summary.mean_recall_at_k, after.summary.mean_recall_at_k),
            metric_delta("MRR", before.summary.mean_mrr, after.summary.mean_mrr),
            metric_delta("nDCG@K", before.summary.mean_ndcg_at_k, after.summary.mean_ndcg_at_k),
        ];

        let worst_query_changes = diff_worst_queries(&before.worst_queries, &after.worst_queries);

        let report = ComparisonReport {
            before_report_id: before_report_id.to_string(),
            after_report_id: after_report_id.to_string(),
            metrics_delta,
            worst_query_changes,
        };

        self.write_markdown(&report, top_n)?;
        Ok(report)
    }

    fn write_markdown(&self, report: &ComparisonReport, top_n: usize) -> CtlResult<()> {
        let dir = self.reports_dir.join("comparisons");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!(
            "{}_vs_{}.md",
            report.after_report_id, report.before_report_id
        ));

        let mut improvements: Vec<&WorstQueryChange> = report.worst_query_changes.iter().filter(|c| c.delta > 0.0).collect();
        improvements.sort_by(|a, b| b.delta.abs().partial_cmp(&a.delta.abs()).unwrap_or(std::cmp::Ordering::Equal));
        improvements.truncate(top_n);

        let mut regressions: Vec<&WorstQueryChange> = report.worst_query_changes.iter().filter(|c| c.delta < 0.0).collect();
        regressions.sort_by(|a, b| b.delta.abs().partial_cmp(&a.delta.abs()).unwrap_or(std::cmp::Ordering::Equal));
        regressions.truncate(top_n);

        let mut body = format!(
            "# Comparison: {} vs {}\n\n## Metric deltas\n\n| Metric | Before | After | Delta |\n|---|---|---|---|\n",
            report.after_report_id, report.before_report_id
        );
        for d in &report.metrics_delta {
            body.push_str(&format!("| {} | {:.4} | {:.4} | {:.4} |\n", d.name, d.before, d.after, d.delta));
        }
        body.push_str("\n## Top improvements\n\n| queryId | delta |\n|---|---|\n");
        for c in &improvements {
            body.push_str(&format!("| {} | {:.4} |\n", c.query_id, c.delta));
        }
        body.push_str("\n## Top regressions\n\n| queryId | delta |\n|---|---|\n");
        for c in &regressions {
            body.push_str(&format!("| {} | {:.4} |\n", c.query_id, c.delta));
        }

        std::fs::write(path, body)?;
        Ok(())
    }
}

fn metric_delta(name: &str, before: f64, after: f64) -> MetricDelta {
    MetricDelta {
        name: name.to_string(),
        before,
        after,
        delta: after - before,
    }
}

fn diff_worst_queries(before: &[WorstQueryEntry], after: &[WorstQueryEntry]) -> Vec<WorstQueryChange> {
    use std::collections::HashMap;
    let before_map: HashMap<&str, &WorstQueryEntry> = before.iter().map(|q| (q.query_id.as_str(), q)).collect();
    let after_map: HashMap<&str, &WorstQueryEntry> = after.iter().map(|q| (q.query_id.as_str(), q)).collect();

    let mut ids: Vec<&str> = before_map.keys().chain(after_map.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();

    ids.into_iter()
        .map(|id| {
            match (before_map.get(id), after_map.get(id)) {
                (Some(b), Some(a)) => {
                    let delta = a.ndcg_at_k - b.ndcg_at_k;
                    let kind = if delta > 0.0 {
                        WorstQueryChangeKind::Improved
                    } else if delta < 0.0 {
                        WorstQueryChangeKind::Regressed
                    } else {
                        WorstQueryChangeKind::Unchanged
                    };
                    WorstQueryChange {
                        query_id: id.to_string(),
                        kind,
                        delta,
                    }
                }
                (Some(b), None) => WorstQueryChange {
                    query_id: id.to_string(),
                    kind: WorstQueryChangeKind::RemovedFromWorst,
                    delta: 1.0 - b.ndcg_at_k,
                },
                (None, Some(a)) => WorstQueryChange {
                    query_id: id.to_string(),
                    kind: WorstQueryChangeKind::NewInWorst,
                    delta: -a.ndcg_at_k,
                },
                (None, None) => unreachable!("query id drawn from the union of both maps"),
            }
        })
        .collect()
}

#[must_use]
pub fn reports_dir(base: &Path) -> PathBuf {
    base.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::QueryResult;
    use chrono::Utc;

    fn run_with(results: Vec<QueryResult>) -> EvaluationRunResult {
        let now = Utc::now();
        EvaluationRunResult {
            dataset_id: "demo".into(),
            top_k: 10,
            started_at: now,
            completed_at: now,
            elapsed_ms: 0,
            target_index: None,
            summary: crate::metrics::summarize(10, &results.iter().map(|r| r.metrics).collect::<Vec<_>>()),
            results,
        }
    }

    fn query_result(id: &str, ndcg: f64, recall: f64) -> QueryResult {
        QueryResult {
            query_id: id.into(),
            intent: "informational".into(),
            hits: vec![],
            metrics: crate::metrics::QueryMetrics {
                ndcg_at_k: ndcg,
                recall_at_k: recall,
                ..crate::metrics::QueryMetrics::default()
            },
        }
    }

    #[test]
    fn writer_persists_metrics_and_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(tmp.path());
        let run = run_with(vec![query_result("q1", 0.9, 1.0), query_result("q2", 0.2, 0.5)]);

        let dir = writer.write(&run, 5, None).unwrap();
        assert!(dir.join("metrics.json").exists());
        assert!(dir.join("summary.md").exists());

        let raw = std::fs::read_to_string(dir.join("metrics.json")).unwrap();
        let report: MetricsReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(report.worst_queries[0].query_id, "q2");
    }

    #[test]
    fn comparator_classifies_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(tmp.path());

        let before_run = run_with(vec![query_result("q1", 0.2, 0.5), query_result("q2", 0.9, 1.0)]);
        let before_dir = writer.write(&before_run, 10, Some("before")).unwrap();
        let before_id = before_dir.file_name().unwrap().to_str().unwrap().to_string();

        let after_run = run_with(vec![query_result("q1", 0.8, 0.9), query_result("q3", 0.1, 0.3)]);
        let after_dir = writer.write(&after_run, 10, Some("after")).unwrap();
        let after_id = after_dir.file_name().unwrap().to_str().unwrap().to_string();

        let comparator = ReportComparator::new(tmp.path());
        let comparison = comparator.compare(&before_id, &after_id, 5).unwrap();

        let q1 = comparison.worst_query_changes.iter().find(|c| c.query_id == "q1").unwrap();
        assert_eq!(q1.kind, WorstQueryChangeKind::Improved);

        let q2 = comparison.worst_query_changes.iter().find(|c| c.query_id == "q2").unwrap();
        assert_eq!(q2.kind, WorstQueryChangeKind::RemovedFromWorst);

        let q3 = comparison.worst_query_changes.iter().find(|c| c.query_id == "q3").unwrap();
        assert_eq!(q3.kind, WorstQueryChangeKind::NewInWorst);

        assert!(tmp.path().join("comparisons").join(format!("{after_id}_vs_{before_id}.md")).exists());
    }

    #[test]
    fn comparator_errors_on_missing_report() {
        let tmp = tempfile::tempdir().unwrap();
        let comparator = ReportComparator::new(tmp.path());
        assert!(comparator.compare("missing1", "missing2", 5).is_err());
    }
}
