//! The evaluation runner: translates queries to searches, pairs
//! hits against judgements, and aggregates IR metrics.

use crate::metrics::{self, EvaluationSummary, JudgedHit, QueryMetrics};
use chrono::{DateTime, Utc};
use searchctl_core::{CtlError, CtlResult, Document, EvalQuery, JudgementSet, QuerySet};
use searchctl_engine::EngineClient;
use searchctl_query::{compose, MultiMatchType, RankingTuning, SearchRequest};
use serde::{Deserialize, Serialize};

/// One ranked hit paired with its judgement, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitRecord {
    pub rank: usize,
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<searchctl_core::Grade>,
    pub judged: bool,
}

/// Per-query results: the ranked hits plus the derived [`QueryMetrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "queryId")]
    pub query_id: String,
    pub intent: String,
    pub hits: Vec<HitRecord>,
    #[serde(flatten)]
    pub metrics: QueryMetrics,
}

/// The full outcome of one `run` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRunResult {
    #[serde(rename = "datasetId")]
    pub dataset_id: String,
    #[serde(rename = "topK")]
    pub top_k: usize,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    #[serde(rename = "targetIndex", skip_serializing_if = "Option::is_none")]
    pub target_index: Option<String>,
    pub summary: EvaluationSummary,
    pub results: Vec<QueryResult>,
}

/// Runs an evaluation dataset against a target index (or the read alias).
pub struct EvaluationRunner<'a> {
    engine: &'a dyn EngineClient,
}

impl<'a> EvaluationRunner<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self { engine }
    }

    /// # Errors
    /// Returns `BadRequest` if the query/judgement sets fail validation (see
    /// [`QuerySet::load`]/[`JudgementSet::load`]), or propagates engine
    /// search failures.
    pub async fn run(
        &self,
        dataset_id: &str,
        query_set: &QuerySet,
        judgement_set: &JudgementSet,
        top_k: usize,
        target_index: Option<&str>,
        multi_match_type: Option<MultiMatchType>,
        ranking_tuning: Option<RankingTuning>,
    ) -> CtlResult<EvaluationRunResult> {
        let started_at = now();
        let mut results = Vec::with_capacity(query_set.len());

        for query in &query_set.queries {
            let result = self
                .run_one(query, judgement_set, top_k, target_index, multi_match_type, ranking_tuning.clone())
                .await?;
            results.push(result);
        }

        let completed_at = now();
        let summary = metrics::summarize(top_k, &results.iter().map(|r| r.metrics).collect::<Vec<_>>());

        Ok(EvaluationRunResult {
            dataset_id: dataset_id.to_string(),
            top_k,
            started_at,
            completed_at,
            elapsed_ms: elapsed_ms(started_at, completed_at),
            target_index: target_index.map(str::to_string),
            summary,
            results,
        })
    }

    async fn run_one(
        &self,
        query: &EvalQuery,
        judgement_set: &JudgementSet,
        top_k: usize,
        target_index: Option<&str>,
        multi_match_type: Option<MultiMatchType>,
        ranking_tuning: Option<RankingTuning>,
    ) -> CtlResult<QueryResult> {
        let mut request = SearchRequest::new(query.query_text.clone());
        request.size = top_k;
        request.target_index = target_index.map(str::to_string);
        if let Some(mm) = multi_match_type {
            request.multi_match_type = mm;
        }
        if let Some(tuning) = ranking_tuning {
            request.ranking_tuning = tuning;
        }
        if let Some(filters) = &query.filters {
            request.category = filters.category.clone();
            request.tags = filters.tags.clone();
            request.author = filters.author.clone();
            request.published_from = filters.published_at_from;
            request.published_to = filters.published_at_to;
        }

        let body = compose(&request);
        let target = target_index.unwrap_or(searchctl_engine::READ_ALIAS);
        let search_result = self
            .engine
            .search(target, &body)
            .await
            .map_err(|e| CtlError::engine(format!("eval:{}", query.query_id), e.to_string()))?;

        let judgements = judgement_set.for_query(&query.query_id);
        let mut hits = Vec::with_capacity(search_result.hits.len());
        let mut judged_hits = Vec::with_capacity(search_result.hits.len());

        for (i, hit) in search_result.hits.into_iter().take(top_k).enumerate() {
            let doc_id = hit.document.id.to_string();
            let grade = judgement_set.grade_for(&query.query_id, &doc_id);
            let judged = judgements.iter().any(|j| j.doc_id == doc_id);
            let rank = i + 1;
            judged_hits.push(JudgedHit { rank, grade, judged });
            hits.push(HitRecord {
                rank,
                document: hit.document,
                score: hit.score,
                grade,
                judged,
            });
        }

        let all_positive_grades: Vec<searchctl_core::Grade> = judgements
            .iter()
            .map(|j| j.grade)
            .filter(|&g| g > 0)
            .collect();
        let query_metrics = metrics::compute_query_metrics(&judged_hits, top_k, &all_positive_grades);

        Ok(QueryResult {
            query_id: query.query_id.clone(),
            intent: query.intent.clone(),
            hits,
            metrics: query_metrics,
        })
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn elapsed_ms(started: DateTime<Utc>, completed: DateTime<Utc>) -> u64 {
    (completed - started).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc as ChronoUtc;
    use searchctl_core::{Judgement, QueryFilters};
    use searchctl_engine::InMemoryEngine;
    use uuid::Uuid;

    fn doc(title: &str) -> Document {
        Document::new(Uuid::new_v4(), title, None, "body", vec![], "tech", "jane", ChronoUtc::now(), 1.0).unwrap()
    }

    #[tokio::test]
    async fn run_pairs_hits_with_judgements() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
        let relevant = doc("rust programming");
        let irrelevant = doc("cooking recipes");
        engine.seed("docs_v1", vec![relevant.clone(), irrelevant.clone()]);

        let query_set = QuerySet {
            queries: vec![EvalQuery {
                query_id: "q1".into(),
                query_text: "rust".into(),
                intent: "informational".into(),
                filters: Some(QueryFilters::default()),
            }],
        };
        let judgement_set = JudgementSet {
            judgements: vec![Judgement {
                query_id: "q1".into(),
                doc_id: relevant.id.to_string(),
                grade: 3,
                note: None,
            }],
        };

        let runner = EvaluationRunner::new(&engine);
        let result = runner
            .run("demo", &query_set, &judgement_set, 10, Some("docs_v1"), None, None)
            .await
            .unwrap();

        assert_eq!(result.results.len(), 1);
        let query_result = &result.results[0];
        assert_eq!(query_result.hits.len(), 1);
        assert_eq!(query_result.metrics.relevant_hits, 1);
        assert!((query_result.metrics.mrr - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn run_over_empty_queryset_yields_zeroed_summary() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
        let query_set = QuerySet { queries: vec![] };
        let judgement_set = JudgementSet { judgements: vec![] };

        let runner = EvaluationRunner::new(&engine);
        let result = runner
            .run("demo", &query_set, &judgement_set, 10, Some("docs_v1"), None, None)
            .await
            .unwrap();

        assert_eq!(result.summary.total_queries, 0);
        assert_eq!(result.summary.top_k, 0);
    }
}
