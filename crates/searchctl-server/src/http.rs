//! Axum router assembly for the admin and public search surfaces.

use crate::state::AppState;
use crate::{admin, search};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the full router: admin surface, public search surface, health.
pub fn create_router(state: AppState) -> Router {
    let cors_layer = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/admin/index/create", post(admin::create_index))
        .route("/admin/index/bulk", post(admin::bulk_index))
        .route("/admin/index/reindex", post(admin::reindex))
        .route("/admin/index/rollback", post(admin::rollback))
        .route("/admin/eval/run", get(admin::eval_run))
        .route("/admin/eval/regression", post(admin::eval_regression))
        .route("/admin/performance/benchmark", post(admin::benchmark))
        .route("/api/search", get(search::search))
        .route("/api/suggest", get(search::suggest))
        .route("/api/health", get(search::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}
