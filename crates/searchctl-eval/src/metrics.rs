//! The metric calculator: Precision@K, Recall@K, MRR, nDCG@K over
//! a single query's judged hits.

use searchctl_core::Grade;
use serde::{Deserialize, Serialize};

/// A single ranked hit paired against its judgement, if any.
#[derive(Debug, Clone)]
pub struct JudgedHit {
    pub rank: usize,
    pub grade: Option<Grade>,
    pub judged: bool,
}

/// Per-query IR metrics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueryMetrics {
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

fn dcg(grades: &[Grade], k: usize) -> f64 {
    grades
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, &grade)| {
            let gain = (2f64.powi(i32::from(grade))) - 1.0;
            gain / (i as f64 + 2.0).log2()
        })
        .sum()
}

/// Compute [`QueryMetrics`] for one query's top-K hits against the full set
/// of positive-grade judgements available for that query (used for recall's
/// denominator and IDCG's ideal ordering).
#[must_use]
pub fn compute_query_metrics(hits: &[JudgedHit], k: usize, all_positive_grades: &[Grade]) -> QueryMetrics {
    let total_hits = hits.len();
    let retrieved = hits.len().min(k).max(1);

    let relevant_hits = hits.iter().filter(|h| h.grade.unwrap_or(0) > 0).count();
    let judged_hits = hits.iter().filter(|h| h.judged).count();

    let precision_at_k = relevant_hits as f64 / retrieved as f64;

    let total_relevant = all_positive_grades.len();
    let recall_at_k = if total_relevant == 0 {
        0.0
    } else {
        relevant_hits as f64 / total_relevant as f64
    };

    let mrr = hits
        .iter()
        .find(|h| h.grade.unwrap_or(0) > 0)
        .map_or(0.0, |h| 1.0 / h.rank as f64);

    let grades: Vec<Grade> = hits.iter().map(|h| h.grade.unwrap_or(0)).collect();
    let dcg_at_k = dcg(&grades, k);

    let mut ideal = all_positive_grades.to_vec();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let idcg_at_k = dcg(&ideal, k);

    let ndcg_at_k = if idcg_at_k == 0.0 { 0.0 } else { dcg_at_k / idcg_at_k };

    QueryMetrics {
        precision_at_k,
        recall_at_k,
        mrr,
        ndcg_at_k,
        judged_hits,
        relevant_hits,
        total_hits,
    }
}

/// Arithmetic-mean summary over a set of per-query metrics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    #[serde(rename = "topK")]
    pub top_k: usize,
    #[serde(rename = "totalQueries")]
    pub total_queries: usize,
    #[serde(rename = "meanPrecisionAtK")]
    pub mean_precision_at_k: f64,
    #[serde(rename = "meanRecallAtK")]
    pub mean_recall_at_k: f64,
    #[serde(rename = "meanMrr")]
    pub mean_mrr: f64,
    #[serde(rename = "meanNdcgAtK")]
    pub mean_ndcg_at_k: f64,
}

#[must_use]
pub fn summarize(top_k: usize, per_query: &[QueryMetrics]) -> EvaluationSummary {
    let total_queries = per_query.len();
    if total_queries == 0 {
        return EvaluationSummary {
            top_k: 0,
            total_queries: 0,
            ..EvaluationSummary::default()
        };
    }
    let n = total_queries as f64;
    EvaluationSummary {
        top_k,
        total_queries,
        mean_precision_at_k: per_query.iter().map(|m| m.precision_at_k).sum::<f64>() / n,
        mean_recall_at_k: per_query.iter().map(|m| m.recall_at_k).sum::<f64>() / n,
        mean_mrr: per_query.iter().map(|m| m.mrr).sum::<f64>() / n,
        mean_ndcg_at_k: per_query.iter().map(|m| m.ndcg_at_k).sum::<f64>() / n,
    }
}
