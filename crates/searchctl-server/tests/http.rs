use http_body_util::BodyExt;
use searchctl_core::{Config, Document};
use searchctl_engine::{EngineClient, InMemoryEngine};
use searchctl_server::{create_router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

fn state_with_engine(engine: InMemoryEngine) -> AppState {
    AppState::new(Arc::new(engine), Config::default(), serde_json::json!({}))
}

async fn seeded_engine() -> InMemoryEngine {
    let engine = InMemoryEngine::new();
    engine
        .create_index("docs_v1", &serde_json::Value::Null)
        .await
        .unwrap();
    let doc = Document::new(
        uuid::Uuid::new_v4(),
        "rust programming",
        None,
        "learn rust",
        vec!["rust".into()],
        "tech",
        "jane",
        chrono::Utc::now(),
        1.0,
    )
    .unwrap();
    engine.seed("docs_v1", vec![doc]);
    engine
        .update_aliases(&[
            searchctl_engine::AliasAction::Add {
                alias: searchctl_engine::READ_ALIAS.to_string(),
                index: "docs_v1".to_string(),
                is_write_index: false,
            },
            searchctl_engine::AliasAction::Add {
                alias: searchctl_engine::WRITE_ALIAS.to_string(),
                index: "docs_v1".to_string(),
                is_write_index: true,
            },
        ])
        .await
        .unwrap();
    engine
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_alias_state() {
    let engine = seeded_engine().await;
    let app = create_router(state_with_engine(engine));

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "up");
}

#[tokio::test]
async fn search_returns_matching_document() {
    let engine = seeded_engine().await;
    let app = create_router(state_with_engine(engine));

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/search?q=rust")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["hits"][0]["document"]["title"], "rust programming");
}

#[tokio::test]
async fn reindex_rejects_equal_versions() {
    let engine = seeded_engine().await;
    let app = create_router(state_with_engine(engine));

    let payload = serde_json::json!({ "sourceVersion": 1, "targetVersion": 1 });
    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/admin/index/reindex")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eval_regression_compares_against_baseline_report() {
    let dataset_dir = tempfile::tempdir().unwrap();
    let reports_dir = tempfile::tempdir().unwrap();

    let doc_id = uuid::Uuid::new_v4();
    let engine = InMemoryEngine::new();
    engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
    let doc = Document::new(doc_id, "rust programming", None, "learn rust", vec!["rust".into()], "tech", "jane", chrono::Utc::now(), 1.0).unwrap();
    engine.seed("docs_v1", vec![doc]);
    engine
        .update_aliases(&[
            searchctl_engine::AliasAction::Add {
                alias: searchctl_engine::READ_ALIAS.to_string(),
                index: "docs_v1".to_string(),
                is_write_index: false,
            },
            searchctl_engine::AliasAction::Add {
                alias: searchctl_engine::WRITE_ALIAS.to_string(),
                index: "docs_v1".to_string(),
                is_write_index: true,
            },
        ])
        .await
        .unwrap();

    let querysets_dir = dataset_dir.path().join("docs/eval/querysets");
    let judgements_dir = dataset_dir.path().join("docs/eval/judgements");
    std::fs::create_dir_all(&querysets_dir).unwrap();
    std::fs::create_dir_all(&judgements_dir).unwrap();
    std::fs::write(
        querysets_dir.join("demo_queries.json"),
        serde_json::json!({
            "queries": [{ "queryId": "q1", "queryText": "rust", "intent": "informational" }]
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        judgements_dir.join("demo_judgements.json"),
        serde_json::json!({
            "judgements": [{ "queryId": "q1", "docId": doc_id.to_string(), "grade": 3 }]
        })
        .to_string(),
    )
    .unwrap();

    let config = Config {
        dataset_base_path: dataset_dir.path().to_path_buf(),
        report_base_path: reports_dir.path().to_path_buf(),
        ..Config::default()
    };
    let state = AppState::new(Arc::new(engine), config, serde_json::json!({}));
    let app = create_router(state);

    let run_regression = |app: axum::Router, baseline_report_id: Option<&str>| {
        let mut payload = serde_json::json!({ "datasetId": "demo" });
        if let Some(id) = baseline_report_id {
            payload["baselineReportId"] = serde_json::Value::String(id.to_string());
        }
        async move {
            app.oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/admin/eval/regression")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let first = run_regression(app.clone(), None).await;
    assert_eq!(first.status(), axum::http::StatusCode::OK);
    let first_body = body_json(first).await;
    let report_id = first_body["data"]["reportId"].as_str().unwrap().to_string();
    assert_ne!(report_id, "reports");
    assert!(first_body["data"]["comparison"].is_null());

    let second = run_regression(app, Some(&report_id)).await;
    assert_eq!(second.status(), axum::http::StatusCode::OK);
    let second_body = body_json(second).await;
    assert!(!second_body["data"]["comparison"].is_null());
}
