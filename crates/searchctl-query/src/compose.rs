//! Pure composition of a [`SearchRequest`] into an engine-native scoring tree
//!. No I/O, no side effects — the same request always composes
//! to the same JSON.

use crate::request::{PopularityMode, SearchRequest, SortMode};
use serde_json::{json, Value};

/// Text fields and their boosts: `title^4, summary^2, body`.
const TEXT_FIELDS: [&str; 3] = ["title^4", "summary^2", "body"];

fn bool_filters(request: &SearchRequest) -> Vec<Value> {
    let mut filters = Vec::new();

    if let Some(category) = &request.category {
        filters.push(json!({ "term": { "category": category } }));
    }
    if !request.tags.is_empty() {
        filters.push(json!({ "terms": { "tags": request.tags } }));
    }
    if let Some(author) = &request.author {
        filters.push(json!({ "term": { "author": author } }));
    }
    if request.published_from.is_some() || request.published_to.is_some() {
        let mut range = serde_json::Map::new();
        if let Some(from) = request.published_from {
            range.insert("gte".into(), json!(from.to_rfc3339()));
        }
        if let Some(to) = request.published_to {
            range.insert("lte".into(), json!(to.to_rfc3339()));
        }
        filters.push(json!({ "range": { "publishedAt": Value::Object(range) } }));
    }
    filters
}

fn multi_match_clause(request: &SearchRequest) -> Value {
    let mut clause = json!({
        "multi_match": {
            "query": request.query,
            "fields": TEXT_FIELDS,
            "type": request.multi_match_type.wire(),
        }
    });
    if matches!(request.multi_match_type, crate::request::MultiMatchType::MostFields) {
        clause["multi_match"]["tie_breaker"] = json!(0.2);
    }
    clause
}

/// The scoring functions attached to the outer `function_score` wrapper,
/// chosen according to `sort`.
fn functions(request: &SearchRequest) -> Vec<Value> {
    let mut funcs = Vec::new();
    let recency = &request.ranking_tuning.recency;
    let popularity = &request.ranking_tuning.popularity;

    let include_recency = recency.enabled
        && matches!(request.sort, SortMode::Relevance | SortMode::Recency);
    let include_popularity_fvf = popularity.enabled
        && matches!(popularity.mode, PopularityMode::FieldValueFactor)
        && matches!(request.sort, SortMode::Relevance | SortMode::Popularity);

    if include_recency {
        funcs.push(json!({
            "gauss": {
                "publishedAt": {
                    "origin": "now",
                    "scale": recency.scale,
                    "decay": recency.decay,
                }
            },
            "weight": recency.weight,
        }));
    }
    if include_popularity_fvf {
        let mut fvf = json!({
            "field": "popularityScore",
            "factor": popularity.factor,
            "missing": popularity.missing,
        });
        if let Some(modifier) = &popularity.modifier {
            fvf["modifier"] = json!(modifier);
        }
        funcs.push(json!({
            "field_value_factor": fvf,
            "weight": popularity.weight,
        }));
    }
    funcs
}

/// Build the `bool` query: scoring `must` clauses plus non-scoring `filter`
/// clauses, optionally a `rank_feature` scoring clause for popularity.
fn bool_query(request: &SearchRequest) -> Value {
    let mut must = vec![multi_match_clause(request)];

    let popularity = &request.ranking_tuning.popularity;
    if popularity.enabled && matches!(popularity.mode, PopularityMode::RankFeature) {
        must.push(json!({
            "rank_feature": {
                "field": "popularityScore",
                "saturation": { "pivot": popularity.pivot },
                "boost": popularity.boost,
            }
        }));
    }

    json!({
        "bool": {
            "must": must,
            "filter": bool_filters(request),
        }
    })
}

/// The engine `sort` array. `RECENCY` orders by `publishedAt` descending in
/// addition to the computed score.
fn outer_sort(request: &SearchRequest) -> Option<Value> {
    match request.sort {
        SortMode::Recency => Some(json!([{ "publishedAt": "desc" }, "_score"])),
        SortMode::Relevance | SortMode::Popularity => None,
    }
}

/// Compose `request` into the engine's native query-DSL body, ready for
/// [`searchctl_engine::port::EngineClient::search`].
#[must_use]
pub fn compose(request: &SearchRequest) -> Value {
    let tuning = &request.ranking_tuning;
    let mut body = json!({
        "query": {
            "function_score": {
                "query": bool_query(request),
                "functions": functions(request),
                "score_mode": tuning.score_mode.wire(),
                "boost_mode": tuning.boost_mode.wire(),
            }
        },
        "from": request.from_offset(),
        "size": request.size,
        "track_total_hits": true,
        "highlight": {
            "fields": {
                "title": {},
                "summary": {},
                "body": {},
            }
        },
    });

    if let Some(sort) = outer_sort(request) {
        body["sort"] = sort;
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{CombineMode, MultiMatchType, PopularityMode, SearchRequest, SortMode};

    #[test]
    fn pagination_uses_page_times_size_offset() {
        let mut request = SearchRequest::new("kubernetes");
        request.page = 3;
        request.size = 10;
        let body = compose(&request);
        assert_eq!(body["from"], 30);
        assert_eq!(body["size"], 10);
    }

    #[test]
    fn most_fields_gets_tie_breaker() {
        let mut request = SearchRequest::new("q");
        request.multi_match_type = MultiMatchType::MostFields;
        let body = compose(&request);
        let must = body["query"]["function_score"]["query"]["bool"]["must"][0].clone();
        assert_eq!(must["multi_match"]["tie_breaker"], 0.2);
    }

    #[test]
    fn best_fields_has_no_tie_breaker() {
        let request = SearchRequest::new("q");
        let body = compose(&request);
        let must = body["query"]["function_score"]["query"]["bool"]["must"][0].clone();
        assert!(must["multi_match"].get("tie_breaker").is_none());
    }

    #[test]
    fn filters_are_conjunctive_and_non_scoring() {
        let mut request = SearchRequest::new("q");
        request.category = Some("tech".into());
        request.tags = vec!["rust".into(), "search".into()];
        request.author = Some("jane".into());
        let body = compose(&request);
        let filter = body["query"]["function_score"]["query"]["bool"]["filter"].clone();
        assert_eq!(filter.as_array().unwrap().len(), 3);
        assert_eq!(filter[0]["term"]["category"], "tech");
        assert_eq!(filter[1]["terms"]["tags"][0], "rust");
        assert_eq!(filter[2]["term"]["author"], "jane");
    }

    #[test]
    fn recency_sort_adds_outer_sort_and_decay_only() {
        let mut request = SearchRequest::new("q");
        request.sort = SortMode::Recency;
        request.ranking_tuning.recency.enabled = true;
        request.ranking_tuning.popularity.enabled = true;
        let body = compose(&request);
        assert_eq!(body["sort"][0]["publishedAt"], "desc");
        let funcs = body["query"]["function_score"]["functions"].as_array().unwrap();
        assert_eq!(funcs.len(), 1);
        assert!(funcs[0].get("gauss").is_some());
    }

    #[test]
    fn popularity_sort_uses_field_value_factor_only() {
        let mut request = SearchRequest::new("q");
        request.sort = SortMode::Popularity;
        request.ranking_tuning.recency.enabled = true;
        request.ranking_tuning.popularity.enabled = true;
        let body = compose(&request);
        let funcs = body["query"]["function_score"]["functions"].as_array().unwrap();
        assert_eq!(funcs.len(), 1);
        assert!(funcs[0].get("field_value_factor").is_some());
        assert!(body.get("sort").is_none());
    }

    #[test]
    fn relevance_sort_includes_both_when_enabled() {
        let mut request = SearchRequest::new("q");
        request.ranking_tuning.recency.enabled = true;
        request.ranking_tuning.popularity.enabled = true;
        let body = compose(&request);
        let funcs = body["query"]["function_score"]["functions"].as_array().unwrap();
        assert_eq!(funcs.len(), 2);
    }

    #[test]
    fn rank_feature_popularity_is_a_scoring_must_clause() {
        let mut request = SearchRequest::new("q");
        request.ranking_tuning.popularity.enabled = true;
        request.ranking_tuning.popularity.mode = PopularityMode::RankFeature;
        let body = compose(&request);
        let must = body["query"]["function_score"]["query"]["bool"]["must"]
            .as_array()
            .unwrap();
        assert_eq!(must.len(), 2);
        assert!(must[1].get("rank_feature").is_some());
    }

    #[test]
    fn score_and_boost_mode_default_to_sum() {
        let request = SearchRequest::new("q");
        assert_eq!(request.ranking_tuning.score_mode, CombineMode::Sum);
        let body = compose(&request);
        assert_eq!(body["query"]["function_score"]["score_mode"], "sum");
        assert_eq!(body["query"]["function_score"]["boost_mode"], "sum");
    }

    #[test]
    fn determinism_same_request_same_body() {
        let request = SearchRequest::new("same query");
        assert_eq!(compose(&request), compose(&request));
    }
}
