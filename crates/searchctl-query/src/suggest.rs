//! Autocomplete/suggest composition.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Input to [`compose_suggest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub prefix: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_suggest_size")]
    pub size: usize,
}

const fn default_suggest_size() -> usize {
    10
}

impl SuggestRequest {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            category: None,
            size: default_suggest_size(),
        }
    }
}

/// `match_phrase_prefix` on `titleAutocomplete`, optional category filter,
/// ordered by score then `publishedAt` descending, with a popularity-only
/// function score.
#[must_use]
pub fn compose_suggest(request: &SuggestRequest) -> Value {
    let mut filter = Vec::new();
    if let Some(category) = &request.category {
        filter.push(json!({ "term": { "category": category } }));
    }

    json!({
        "query": {
            "function_score": {
                "query": {
                    "bool": {
                        "must": [{
                            "match_phrase_prefix": {
                                "titleAutocomplete": {
                                    "query": request.prefix,
                                    "max_expansions": 50,
                                }
                            }
                        }],
                        "filter": filter,
                    }
                },
                "functions": [{
                    "field_value_factor": {
                        "field": "popularityScore",
                        "factor": 1.0,
                        "modifier": "log1p",
                        "missing": 0.0,
                    }
                }],
                "score_mode": "sum",
                "boost_mode": "multiply",
            }
        },
        "size": request.size,
        "sort": ["_score", { "publishedAt": "desc" }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_uses_title_autocomplete_with_max_expansions() {
        let request = SuggestRequest::new("kuber");
        let body = compose_suggest(&request);
        let clause = &body["query"]["function_score"]["query"]["bool"]["must"][0]
            ["match_phrase_prefix"]["titleAutocomplete"];
        assert_eq!(clause["query"], "kuber");
        assert_eq!(clause["max_expansions"], 50);
    }

    #[test]
    fn suggest_category_filter_is_optional() {
        let request = SuggestRequest::new("kuber");
        let body = compose_suggest(&request);
        let filter = body["query"]["function_score"]["query"]["bool"]["filter"]
            .as_array()
            .unwrap();
        assert!(filter.is_empty());
    }
}
