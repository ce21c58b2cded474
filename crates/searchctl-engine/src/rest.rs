//! A REST [`EngineClient`] implementation against an Elasticsearch/OpenSearch
//! style engine, reached over HTTP via `reqwest`.

use crate::model::{
    AliasAction, BulkIndexOp, BulkItemOutcome, ReindexOutcome, SearchResult as EngineSearchResult,
};
use crate::port::EngineClient;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use searchctl_core::{CtlError, CtlResult, Document};
use serde_json::{json, Value};

/// REST-backed engine client. `base_url` has no trailing slash.
pub struct RestEngineClient {
    client: Client,
    base_url: String,
}

impl RestEngineClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn engine_err(context: &str, resp: reqwest::Response) -> CtlError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        CtlError::engine(context, format!("HTTP {status}: {body}"))
    }
}

#[async_trait]
impl EngineClient for RestEngineClient {
    async fn create_index(&self, name: &str, template: &Value) -> CtlResult<()> {
        let resp = self
            .client
            .put(self.url(name))
            .json(template)
            .send()
            .await
            .map_err(|e| CtlError::engine(name, e.to_string()))?;
        if resp.status() == StatusCode::BAD_REQUEST || resp.status() == StatusCode::CONFLICT {
            return Err(CtlError::Conflict(format!("index already exists: {name}")));
        }
        if !resp.status().is_success() {
            return Err(Self::engine_err(name, resp).await);
        }
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> CtlResult<bool> {
        let resp = self
            .client
            .head(self.url(name))
            .send()
            .await
            .map_err(|e| CtlError::engine(name, e.to_string()))?;
        Ok(resp.status().is_success())
    }

    async fn delete_index(&self, name: &str) -> CtlResult<()> {
        let resp = self
            .client
            .delete(self.url(name))
            .send()
            .await
            .map_err(|e| CtlError::engine(name, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err(name, resp).await);
        }
        Ok(())
    }

    async fn count(&self, index: &str) -> CtlResult<u64> {
        let resp = self
            .client
            .get(self.url(&format!("{index}/_count")))
            .send()
            .await
            .map_err(|e| CtlError::engine(index, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err(index, resp).await);
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| CtlError::engine(index, e.to_string()))?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| CtlError::engine(index, "missing count field in engine response"))
    }

    async fn scan(&self, index: &str, from: usize, size: usize) -> CtlResult<Vec<Document>> {
        let body = json!({
            "from": from,
            "size": size,
            "sort": [{"id": "asc"}],
            "query": {"match_all": {}},
        });
        let resp = self
            .client
            .post(self.url(&format!("{index}/_search")))
            .json(&body)
            .send()
            .await
            .map_err(|e| CtlError::engine(index, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err(index, resp).await);
        }
        let result: EngineSearchResult = resp
            .json()
            .await
            .map_err(|e| CtlError::engine(index, e.to_string()))?;
        let mut docs: Vec<Document> = result.hits.into_iter().map(|h| h.document).collect();
        docs.sort_by_key(|d| d.id);
        Ok(docs)
    }

    async fn search(&self, target: &str, body: &Value) -> CtlResult<EngineSearchResult> {
        let resp = self
            .client
            .post(self.url(&format!("{target}/_search")))
            .json(body)
            .send()
            .await
            .map_err(|e| CtlError::engine(target, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err(target, resp).await);
        }
        resp.json()
            .await
            .map_err(|e| CtlError::engine(target, e.to_string()))
    }

    async fn bulk(&self, target: &str, ops: &[BulkIndexOp]) -> CtlResult<Vec<BulkItemOutcome>> {
        let body = json!({ "operations": ops });
        let resp = self
            .client
            .post(self.url(&format!("{target}/_bulk")))
            .json(&body)
            .send()
            .await
            .map_err(|e| CtlError::engine(target, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err(target, resp).await);
        }
        resp.json()
            .await
            .map_err(|e| CtlError::engine(target, e.to_string()))
    }

    async fn reindex(
        &self,
        source: &str,
        target: &str,
        wait_for_completion: bool,
        refresh: bool,
    ) -> CtlResult<ReindexOutcome> {
        let context = format!("{source}->{target}");
        let body = json!({
            "source": {"index": source},
            "dest": {"index": target},
            "wait_for_completion": wait_for_completion,
            "refresh": refresh,
        });
        let resp = self
            .client
            .post(self.url("_reindex"))
            .json(&body)
            .send()
            .await
            .map_err(|e| CtlError::engine(&context, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err(&context, resp).await);
        }
        resp.json()
            .await
            .map_err(|e| CtlError::engine(&context, e.to_string()))
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> CtlResult<()> {
        let body = json!({ "actions": actions });
        let resp = self
            .client
            .post(self.url("_aliases"))
            .json(&body)
            .send()
            .await
            .map_err(|e| CtlError::engine("alias-update", e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err("alias-update", resp).await);
        }
        Ok(())
    }

    async fn refresh(&self, index: &str) -> CtlResult<()> {
        let resp = self
            .client
            .post(self.url(&format!("{index}/_refresh")))
            .send()
            .await
            .map_err(|e| CtlError::engine(index, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::engine_err(index, resp).await);
        }
        Ok(())
    }

    async fn alias_targets(&self, alias: &str) -> CtlResult<Vec<String>> {
        let resp = self
            .client
            .get(self.url(&format!("_alias/{alias}")))
            .send()
            .await
            .map_err(|e| CtlError::engine(alias, e.to_string()))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(Self::engine_err(alias, resp).await);
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| CtlError::engine(alias, e.to_string()))?;
        let targets = body
            .as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();
        Ok(targets)
    }
}
