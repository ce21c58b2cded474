//! An in-memory [`EngineClient`] double for unit/integration tests.
//!
//! It interprets the query-DSL shape produced by `searchctl-query::compose`
//! (bool `must`/`filter` under a `function_score` wrapper) well enough to
//! drive realistic tests of the validator, orchestrator, and evaluation
//! runner without a live engine.

use crate::model::{
    AliasAction, BulkIndexOp, BulkItemOutcome, ReindexOutcome, SearchHit, SearchResult,
};
use crate::port::EngineClient;
use async_trait::async_trait;
use searchctl_core::{CtlError, CtlResult, Document};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct State {
    indices: HashMap<String, BTreeMap<Uuid, Document>>,
    aliases: HashMap<String, Vec<String>>,
}

/// In-memory engine double. Cheap to construct; safe to share across
/// `tokio::test` tasks via `Arc`.
#[derive(Default)]
pub struct InMemoryEngine {
    state: Mutex<State>,
}

impl InMemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directly seed `index` with documents, bypassing `bulk` (test setup
    /// convenience).
    pub fn seed(&self, index: &str, docs: Vec<Document>) {
        let mut state = self.state.lock().unwrap();
        let map = state.indices.entry(index.to_string()).or_default();
        for doc in docs {
            map.insert(doc.id, doc);
        }
    }

    fn resolve_target<'a>(
        indices: &'a HashMap<String, BTreeMap<Uuid, Document>>,
        aliases: &HashMap<String, Vec<String>>,
        target: &str,
    ) -> CtlResult<&'a BTreeMap<Uuid, Document>> {
        if let Some(map) = indices.get(target) {
            return Ok(map);
        }
        if let Some(bound) = aliases.get(target) {
            if let Some(index) = bound.first() {
                if let Some(map) = indices.get(index) {
                    return Ok(map);
                }
            }
        }
        Err(CtlError::NotFound(format!("no such index or alias: {target}")))
    }
}

fn text_matches(doc: &Document, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {}",
        doc.title,
        doc.summary.as_deref().unwrap_or(""),
        doc.body
    )
    .to_lowercase();
    haystack.contains(&query.to_lowercase())
}

fn filter_matches(doc: &Document, filter: &Value) -> bool {
    let Some(filters) = filter.as_array() else {
        return true;
    };
    for clause in filters {
        if let Some(category) = clause.get("term").and_then(|t| t.get("category")) {
            if Some(category.as_str().unwrap_or_default()) != Some(doc.category.as_str()) {
                return false;
            }
        }
        if let Some(author) = clause.get("term").and_then(|t| t.get("author")) {
            if Some(author.as_str().unwrap_or_default()) != Some(doc.author.as_str()) {
                return false;
            }
        }
        if let Some(tags) = clause.get("terms").and_then(|t| t.get("tags")) {
            let wanted: Vec<&str> = tags.as_array().map_or_else(Vec::new, |a| {
                a.iter().filter_map(Value::as_str).collect()
            });
            if !wanted.is_empty() && !doc.tags.iter().any(|t| wanted.contains(&t.as_str())) {
                return false;
            }
        }
        if let Some(range) = clause.get("range").and_then(|r| r.get("publishedAt")) {
            if let Some(gte) = range.get("gte").and_then(Value::as_str) {
                if let Ok(from) = chrono::DateTime::parse_from_rfc3339(gte) {
                    if doc.published_at < from {
                        return false;
                    }
                }
            }
            if let Some(lte) = range.get("lte").and_then(Value::as_str) {
                if let Ok(to) = chrono::DateTime::parse_from_rfc3339(lte) {
                    if doc.published_at > to {
                        return false;
                    }
                }
            }
        }
    }
    true
}

fn score_doc(doc: &Document, body: &Value) -> f64 {
    let functions = body["query"]["function_score"]["functions"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let mut score = 1.0;
    for function in &functions {
        if let Some(fvf) = function.get("field_value_factor") {
            let factor = fvf.get("factor").and_then(Value::as_f64).unwrap_or(1.0);
            let weight = function.get("weight").and_then(Value::as_f64).unwrap_or(1.0);
            score += weight * factor * (doc.popularity_score + 1.0).ln();
        }
        if function.get("gauss").is_some() {
            let weight = function.get("weight").and_then(Value::as_f64).unwrap_or(1.0);
            score += weight * 0.5;
        }
    }
    score
}

fn extract_query_text(body: &Value) -> Option<String> {
    let must = body["query"]["function_score"]["query"]["bool"]["must"].as_array()?;
    for clause in must {
        if let Some(mm) = clause.get("multi_match") {
            return mm.get("query").and_then(Value::as_str).map(String::from);
        }
        if let Some(mpp) = clause.get("match_phrase_prefix") {
            return mpp
                .get("titleAutocomplete")
                .and_then(|t| t.get("query"))
                .and_then(Value::as_str)
                .map(String::from);
        }
    }
    None
}

#[async_trait]
impl EngineClient for InMemoryEngine {
    async fn create_index(&self, name: &str, _template: &Value) -> CtlResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.indices.contains_key(name) {
            return Err(CtlError::Conflict(format!("index already exists: {name}")));
        }
        state.indices.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> CtlResult<bool> {
        Ok(self.state.lock().unwrap().indices.contains_key(name))
    }

    async fn delete_index(&self, name: &str) -> CtlResult<()> {
        self.state.lock().unwrap().indices.remove(name);
        Ok(())
    }

    async fn count(&self, index: &str) -> CtlResult<u64> {
        let state = self.state.lock().unwrap();
        let map = Self::resolve_target(&state.indices, &state.aliases, index)?;
        Ok(map.len() as u64)
    }

    async fn scan(&self, index: &str, from: usize, size: usize) -> CtlResult<Vec<Document>> {
        let state = self.state.lock().unwrap();
        let map = Self::resolve_target(&state.indices, &state.aliases, index)?;
        Ok(map.values().skip(from).take(size).cloned().collect())
    }

    async fn search(&self, target: &str, body: &Value) -> CtlResult<SearchResult> {
        let state = self.state.lock().unwrap();
        let map = Self::resolve_target(&state.indices, &state.aliases, target)?;
        let query_text = extract_query_text(body).unwrap_or_default();
        let filter = &body["query"]["function_score"]["query"]["bool"]["filter"];

        let mut scored: Vec<(f64, &Document)> = map
            .values()
            .filter(|doc| text_matches(doc, &query_text) && filter_matches(doc, filter))
            .map(|doc| (score_doc(doc, body), doc))
            .collect();

        let sort_by_date = body["sort"][0]["publishedAt"] == "desc";
        if sort_by_date {
            scored.sort_by(|a, b| b.1.published_at.cmp(&a.1.published_at).then(a.1.id.cmp(&b.1.id)));
        } else {
            scored.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.id.cmp(&b.1.id))
            });
        }

        let total = scored.len() as u64;
        let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
        let size = body.get("size").and_then(Value::as_u64).unwrap_or(20) as usize;

        let hits = scored
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(score, doc)| SearchHit {
                document: doc.clone(),
                score: Some(score),
                highlights: HashMap::new(),
            })
            .collect();

        Ok(SearchResult {
            total,
            took_ms: 0,
            hits,
        })
    }

    async fn bulk(&self, target: &str, ops: &[BulkIndexOp]) -> CtlResult<Vec<BulkItemOutcome>> {
        let mut state = self.state.lock().unwrap();
        let index_name = state
            .aliases
            .get(target)
            .and_then(|bound| bound.first().cloned())
            .unwrap_or_else(|| target.to_string());
        let map = state.indices.entry(index_name).or_default();
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            map.insert(op.id, op.doc.clone());
            outcomes.push(BulkItemOutcome {
                id: op.id,
                status: 201,
                error: None,
            });
        }
        Ok(outcomes)
    }

    async fn reindex(
        &self,
        source: &str,
        target: &str,
        _wait_for_completion: bool,
        _refresh: bool,
    ) -> CtlResult<ReindexOutcome> {
        let mut state = self.state.lock().unwrap();
        let source_docs: Vec<Document> = state
            .indices
            .get(source)
            .ok_or_else(|| CtlError::NotFound(format!("no such index: {source}")))?
            .values()
            .cloned()
            .collect();
        let target_map = state
            .indices
            .get_mut(target)
            .ok_or_else(|| CtlError::NotFound(format!("no such index: {target}")))?;
        for doc in source_docs {
            target_map.insert(doc.id, doc);
        }
        Ok(ReindexOutcome {
            took_ms: 0,
            failures: Vec::new(),
        })
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> CtlResult<()> {
        let mut state = self.state.lock().unwrap();
        for action in actions {
            match action {
                AliasAction::RemoveFromAny { alias } => {
                    state.aliases.remove(alias);
                }
                AliasAction::Add {
                    alias,
                    index,
                    is_write_index: _,
                } => {
                    if !state.indices.contains_key(index) {
                        return Err(CtlError::Conflict(format!(
                            "cannot bind alias {alias} to missing index {index}"
                        )));
                    }
                    state.aliases.insert(alias.clone(), vec![index.clone()]);
                }
            }
        }
        Ok(())
    }

    async fn refresh(&self, _index: &str) -> CtlResult<()> {
        Ok(())
    }

    async fn alias_targets(&self, alias: &str) -> CtlResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .aliases
            .get(alias)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(title: &str) -> Document {
        Document::new(
            Uuid::new_v4(),
            title,
            None,
            "body text",
            vec![],
            "tech",
            "jane",
            Utc::now(),
            1.0,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_index_then_exists() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &Value::Null).await.unwrap();
        assert!(engine.index_exists("docs_v1").await.unwrap());
    }

    #[tokio::test]
    async fn create_index_twice_conflicts() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &Value::Null).await.unwrap();
        assert!(engine.create_index("docs_v1", &Value::Null).await.is_err());
    }

    #[tokio::test]
    async fn scan_is_ascending_by_id() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &Value::Null).await.unwrap();
        engine.seed("docs_v1", vec![doc("b"), doc("a"), doc("c")]);
        let docs = engine.scan("docs_v1", 0, 10).await.unwrap();
        let ids: Vec<Uuid> = docs.iter().map(|d| d.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn alias_update_rejects_missing_target() {
        let engine = InMemoryEngine::new();
        let result = engine
            .update_aliases(&[AliasAction::Add {
                alias: "docs_read".into(),
                index: "docs_v1".into(),
                is_write_index: false,
            }])
            .await;
        assert!(result.is_err());
    }
}
