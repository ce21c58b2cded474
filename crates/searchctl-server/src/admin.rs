//! Admin handlers: direct request-DTO to core-call to response-DTO adapters.
//! No business logic lives here — every handler just wires a DTO through to
//! the matching core component and wraps the result in [`crate::envelope`].

use crate::envelope::{ok, ApiResult};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use searchctl_core::{CtlError, Document, JudgementSet, QuerySet};
use searchctl_engine::WRITE_ALIAS;
use searchctl_eval::{PerformanceBenchmarker, PerformanceComparator, ReportWriter, ReportComparator};
use searchctl_index::{BlueGreenOrchestrator, BlueGreenRequest, BulkIndexer, RollbackService};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndexQuery {
    pub version: u32,
}

pub async fn create_index(
    State(state): State<AppState>,
    Query(query): Query<CreateIndexQuery>,
) -> ApiResult<Response> {
    let generation = searchctl_core::Generation::new(query.version)?;
    let index_name = generation.index_name();
    state
        .engine
        .create_index(&index_name, &state.index_template)
        .await?;
    Ok(ok(&serde_json::json!({ "indexName": index_name })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIndexBody {
    #[serde(default)]
    pub target_alias: Option<String>,
    pub documents: Vec<Document>,
}

pub async fn bulk_index(State(state): State<AppState>, Json(body): Json<BulkIndexBody>) -> ApiResult<Response> {
    let indexer = BulkIndexer::new(
        state.engine.as_ref(),
        state.config.bulk_indexer.chunk_size,
        state.config.bulk_indexer.max_retries,
    );
    let target = body.target_alias.unwrap_or_else(|| WRITE_ALIAS.to_string());
    let result = indexer.index(body.documents, Some(&target), "admin-bulk").await?;
    Ok(ok(&result))
}

pub async fn reindex(State(state): State<AppState>, Json(body): Json<BlueGreenRequest>) -> ApiResult<Response> {
    let orchestrator = BlueGreenOrchestrator::new(
        state.engine.as_ref(),
        (*state.index_template).clone(),
        state.config.validation.clone(),
        state.config.reports_dir(),
    );
    let result = orchestrator.reindex(body).await?;
    Ok(ok(&result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackBody {
    pub current_index: String,
    pub rollback_to_index: String,
}

pub async fn rollback(State(state): State<AppState>, Json(body): Json<RollbackBody>) -> ApiResult<Response> {
    let service = RollbackService::new(state.engine.as_ref());
    let result = service.rollback(&body.current_index, &body.rollback_to_index).await?;
    Ok(ok(&result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalRunQuery {
    pub dataset_id: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub worst_queries: Option<usize>,
    #[serde(default)]
    pub generate_report: bool,
}

pub async fn eval_run(State(state): State<AppState>, Query(query): Query<EvalRunQuery>) -> ApiResult<Response> {
    let query_set = QuerySet::load(&state.config.queryset_path(&query.dataset_id))?;
    let judgement_set = JudgementSet::load(&state.config.judgements_path(&query.dataset_id), &query_set)?;
    let top_k = query.top_k.unwrap_or(10);

    let runner = searchctl_eval::EvaluationRunner::new(state.engine.as_ref());
    let run = runner
        .run(&query.dataset_id, &query_set, &judgement_set, top_k, None, None, None)
        .await?;

    let report_path = if query.generate_report {
        let writer = ReportWriter::new(state.config.reports_dir());
        let worst_queries = query.worst_queries.unwrap_or(state.config.worst_queries_count);
        Some(writer.write(&run, worst_queries, None)?)
    } else {
        None
    };

    Ok(ok(&serde_json::json!({
        "run": run,
        "reportPath": report_path,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalRegressionBody {
    pub dataset_id: String,
    #[serde(default)]
    pub baseline_report_id: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub worst_queries: Option<usize>,
    #[serde(default)]
    pub target_index: Option<String>,
    #[serde(default)]
    pub report_id_prefix: Option<String>,
}

pub async fn eval_regression(
    State(state): State<AppState>,
    Json(body): Json<EvalRegressionBody>,
) -> ApiResult<Response> {
    let query_set = QuerySet::load(&state.config.queryset_path(&body.dataset_id))?;
    let judgement_set = JudgementSet::load(&state.config.judgements_path(&body.dataset_id), &query_set)?;
    let top_k = body.top_k.unwrap_or(10);

    let runner = searchctl_eval::EvaluationRunner::new(state.engine.as_ref());
    let run = runner
        .run(
            &body.dataset_id,
            &query_set,
            &judgement_set,
            top_k,
            body.target_index.as_deref(),
            None,
            None,
        )
        .await?;

    let writer = ReportWriter::new(state.config.reports_dir());
    let worst_queries = body.worst_queries.unwrap_or(state.config.worst_queries_count);
    let report_path = writer.write(&run, worst_queries, body.report_id_prefix.as_deref())?;
    let report_id = report_id_from_path(&report_path)?;

    let comparison = match &body.baseline_report_id {
        Some(baseline) => {
            let comparator = ReportComparator::new(state.config.reports_dir());
            Some(comparator.compare(baseline, &report_id, worst_queries)?)
        }
        None => None,
    };

    Ok(ok(&serde_json::json!({
        "run": run,
        "reportId": report_id,
        "comparison": comparison,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkBody {
    pub dataset_id: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(default)]
    pub warmups: Option<u32>,
    #[serde(default)]
    pub target_index: Option<String>,
    #[serde(default)]
    pub report_id_prefix: Option<String>,
    #[serde(default)]
    pub baseline_run_id: Option<String>,
}

pub async fn benchmark(State(state): State<AppState>, Json(body): Json<BenchmarkBody>) -> ApiResult<Response> {
    let query_set = QuerySet::load(&state.config.queryset_path(&body.dataset_id))?;
    let top_k = body.top_k.unwrap_or(10);
    let iterations = body.iterations.unwrap_or(state.config.benchmark.iterations);
    let warmups = body.warmups.unwrap_or(state.config.benchmark.warmups);
    let prefix = body.report_id_prefix.as_deref().unwrap_or("bench");

    let benchmarker = PerformanceBenchmarker::new(state.engine.as_ref(), state.config.reports_dir());
    let result = benchmarker
        .run(
            &body.dataset_id,
            &query_set,
            top_k,
            iterations,
            warmups,
            body.target_index.as_deref(),
            prefix,
        )
        .await?;

    let comparison = match &body.baseline_run_id {
        Some(baseline) => {
            let comparator = PerformanceComparator::new(state.config.reports_dir());
            Some(comparator.compare(baseline, &result.run_id, 5)?)
        }
        None => None,
    };

    Ok(ok(&serde_json::json!({
        "result": result,
        "comparison": comparison,
    })))
}

fn report_id_from_path(path: &std::path::Path) -> ApiResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| CtlError::Internal("report path missing reportId component".into()).into())
}
