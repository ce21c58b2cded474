//! Public search handlers: `GET /api/search`, `GET /api/suggest`,
//! `GET /api/health`. Thin adapters over [`searchctl_query::compose`] and
//! [`searchctl_query::compose_suggest`].

use crate::envelope::{ok, ApiResult};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use searchctl_query::{compose, compose_suggest, SearchRequest, SortMode, SuggestRequest};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub sort: Option<SortMode>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub published_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_to: Option<DateTime<Utc>>,
}

pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> ApiResult<Response> {
    let mut request = SearchRequest::new(query.q);
    request.category = query.category;
    request.author = query.author;
    request.tags = query
        .tags
        .map(|csv| csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();
    if let Some(sort) = query.sort {
        request.sort = sort;
    }
    if let Some(page) = query.page {
        request.page = page;
    }
    if let Some(size) = query.size {
        request.size = size;
    }
    request.published_from = query.published_from;
    request.published_to = query.published_to;

    let body = compose(&request);
    let target = request.target_index.as_deref().unwrap_or(searchctl_engine::READ_ALIAS);
    let result = state
        .engine
        .search(target, &body)
        .await
        .map_err(|e| searchctl_core::CtlError::engine("api-search", e.to_string()))?;
    Ok(ok(&result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestQuery {
    pub q: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<usize>,
}

pub async fn suggest(State(state): State<AppState>, Query(query): Query<SuggestQuery>) -> ApiResult<Response> {
    let mut request = SuggestRequest::new(query.q);
    request.category = query.category;
    if let Some(size) = query.size {
        request.size = size;
    }

    let body = compose_suggest(&request);
    let result = state
        .engine
        .search(searchctl_engine::READ_ALIAS, &body)
        .await
        .map_err(|e| searchctl_core::CtlError::engine("api-suggest", e.to_string()))?;
    Ok(ok(&result))
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Response> {
    let alias_state = searchctl_index::AliasManager::new(state.engine.as_ref())
        .current_alias_state()
        .await?;
    Ok(ok(&serde_json::json!({ "status": "up", "alias": alias_state })))
}
