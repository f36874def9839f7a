//! Search request construction.

use crate::document::ensure_object;
use crate::error::{DocStoreError, Result};
use crate::page::PageRequest;
use serde_json::{json, Value};

/// A fully built search request for one index.
///
/// Built fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequestSpec {
    /// Index to search.
    pub index: String,
    /// Caller's query body.
    pub raw_query: Value,
    /// Skip missing or closed indices instead of failing.
    pub ignore_unavailable: bool,
    /// Hits to return, overriding the body.
    pub size: Option<u64>,
    /// Offset of the first hit, overriding the body.
    pub from: Option<u64>,
    /// Ask the store to prefix aggregation and suggestion keys with their type.
    pub typed_keys: bool,
}

impl SearchRequestSpec {
    /// Build a request from raw JSON.
    ///
    /// Without a page the caller's JSON controls the result size. With a page,
    /// the page's `size` and `from` replace any the JSON carries.
    pub fn build(index: &str, raw_query_json: &str, page: Option<&PageRequest>) -> Result<Self> {
        let raw_query = ensure_object(serde_json::from_str(raw_query_json)?, "search body")?;
        Self::from_value(index, raw_query, page)
    }

    /// Build a request from an already parsed body.
    pub fn from_value(index: &str, raw_query: Value, page: Option<&PageRequest>) -> Result<Self> {
        if index.is_empty() {
            return Err(DocStoreError::InvalidInput("index name cannot be empty".to_string()));
        }
        let raw_query = ensure_object(raw_query, "search body")?;

        Ok(Self {
            index: index.to_string(),
            raw_query,
            ignore_unavailable: true,
            size: page.map(PageRequest::page_size),
            from: page.map(|p| p.from()),
            typed_keys: false,
        })
    }

    /// Single match query on one field.
    pub fn simple_match(index: &str, field: &str, keyword: &str) -> Result<Self> {
        Self::from_value(index, match_body(field, keyword), None)
    }

    /// Request type-prefixed aggregation and suggestion keys.
    pub fn with_typed_keys(mut self) -> Self {
        self.typed_keys = true;
        self
    }

    /// The body sent to the store.
    pub fn body(&self) -> Value {
        let mut body = self.raw_query.clone();
        if let Value::Object(map) = &mut body {
            if let Some(size) = self.size {
                map.insert("size".to_string(), json!(size));
            }
            if let Some(from) = self.from {
                map.insert("from".to_string(), json!(from));
            }
        }
        body
    }
}

/// `{"query": {"match": {field: keyword}}}`
pub(crate) fn match_body(field: &str, keyword: &str) -> Value {
    json!({
        "query": {
            "match": {
                field: keyword
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH_ALL: &str = r#"{"size": 20, "query": {"match_all": {}}}"#;

    #[test]
    fn test_build_without_page() {
        let spec = SearchRequestSpec::build("product", MATCH_ALL, None).unwrap();
        assert_eq!(spec.index, "product");
        assert!(spec.ignore_unavailable);
        assert_eq!(spec.size, None);
        assert_eq!(spec.from, None);
        assert!(!spec.typed_keys);
        assert_eq!(spec.body()["size"], 20);
        assert!(spec.body().get("from").is_none());
    }

    #[test]
    fn test_build_with_page_overrides_body() {
        let page = PageRequest::of(2, 10);
        let spec = SearchRequestSpec::build("product", MATCH_ALL, Some(&page)).unwrap();
        assert_eq!(spec.size, Some(10));
        assert_eq!(spec.from, Some(10));

        let body = spec.body();
        assert_eq!(body["size"], 10);
        assert_eq!(body["from"], 10);
        assert_eq!(body["query"], json!({ "match_all": {} }));
        // the raw query stays untouched
        assert_eq!(spec.raw_query["size"], 20);
    }

    #[test]
    fn test_build_normalizes_page() {
        let page = PageRequest::of(0, -1);
        let spec = SearchRequestSpec::build("product", "{}", Some(&page)).unwrap();
        assert_eq!(spec.body(), json!({ "size": 10, "from": 0 }));
    }

    #[test]
    fn test_build_rejects_bad_input() {
        assert!(matches!(
            SearchRequestSpec::build("product", "[]", None),
            Err(DocStoreError::InvalidInput(_))
        ));
        assert!(matches!(
            SearchRequestSpec::build("product", "{", None),
            Err(DocStoreError::Serialization(_))
        ));
        assert!(matches!(
            SearchRequestSpec::build("", "{}", None),
            Err(DocStoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_simple_match() {
        let spec = SearchRequestSpec::simple_match("product", "title", "apple").unwrap();
        assert_eq!(spec.body(), json!({ "query": { "match": { "title": "apple" } } }));
        assert!(spec.with_typed_keys().typed_keys);
    }
}
