//! Normalization of raw store responses.

use crate::error::{DocStoreError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Search result.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// Total matching documents reported by the store.
    pub total: u64,
    /// Total relation (`eq` or `gte`).
    pub total_relation: String,
    /// Maximum score.
    pub max_score: Option<f64>,
    /// Matching documents with metadata, in response order.
    pub hits: Vec<Hit<T>>,
    /// Time taken in milliseconds.
    pub took_ms: u64,
}

impl<T> SearchResult<T> {
    /// Drop the metadata and keep the documents.
    pub fn into_documents(self) -> Vec<T> {
        self.hits.into_iter().map(|h| h.source).collect()
    }
}

/// A search hit.
#[derive(Debug, Clone)]
pub struct Hit<T> {
    /// Document ID.
    pub id: String,
    /// Index name.
    pub index: String,
    /// Document score (relevance).
    pub score: Option<f64>,
    /// Highlighted fields.
    pub highlight: Option<HashMap<String, Vec<String>>>,
    /// Decoded `_source`.
    pub source: T,
}

impl<T: DeserializeOwned> SearchResult<T> {
    /// Decode a search or search-template response.
    pub fn from_response(body: &Value) -> Result<Self> {
        let mut hits = Vec::new();

        for hit in hit_list(body) {
            let source = hit.get("_source").ok_or_else(|| {
                DocStoreError::UnexpectedResponse(format!(
                    "hit {} has no _source",
                    hit["_id"].as_str().unwrap_or("?")
                ))
            })?;

            hits.push(Hit {
                id: hit["_id"].as_str().unwrap_or("").to_string(),
                index: hit["_index"].as_str().unwrap_or("").to_string(),
                score: hit["_score"].as_f64(),
                highlight: hit["highlight"].as_object().map(parse_highlight),
                source: serde_json::from_value(source.clone())?,
            });
        }

        Ok(SearchResult {
            total: total_hits(body),
            total_relation: body["hits"]["total"]["relation"]
                .as_str()
                .unwrap_or("eq")
                .to_string(),
            max_score: body["hits"]["max_score"].as_f64(),
            hits,
            took_ms: body["took"].as_u64().unwrap_or(0),
        })
    }
}

fn parse_highlight(h: &Map<String, Value>) -> HashMap<String, Vec<String>> {
    h.iter()
        .map(|(k, v)| {
            let fragments = v
                .as_array()
                .map(|a| a.iter().filter_map(|s| s.as_str().map(String::from)).collect())
                .unwrap_or_default();
            (k.clone(), fragments)
        })
        .collect()
}

/// The `hits.hits` array, empty when absent.
pub(crate) fn hit_list(body: &Value) -> &[Value] {
    body["hits"]["hits"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Total hits, from `hits.total.value` or a bare integer `hits.total`.
pub fn total_hits(body: &Value) -> u64 {
    let total = &body["hits"]["total"];
    total["value"].as_u64().or_else(|| total.as_u64()).unwrap_or(0)
}

/// Decode each hit's `_source` in response order.
pub fn sources<T: DeserializeOwned>(body: &Value) -> Result<Vec<T>> {
    Ok(SearchResult::<T>::from_response(body)?.into_documents())
}

/// Each hit's `fields` projection. Hits without one yield an empty map.
pub fn field_maps(body: &Value) -> Vec<Map<String, Value>> {
    hit_list(body)
        .iter()
        .map(|hit| hit["fields"].as_object().cloned().unwrap_or_default())
        .collect()
}

/// The `acknowledged` flag of an admin response.
pub(crate) fn acknowledged(body: &Value) -> Result<bool> {
    body["acknowledged"]
        .as_bool()
        .ok_or_else(|| DocStoreError::UnexpectedResponse("acknowledged flag missing".to_string()))
}

/// The `found` flag of a get response.
pub(crate) fn found(body: &Value) -> bool {
    body["found"].as_bool().unwrap_or(false)
}

/// The `updated` count of an update-by-query response.
pub(crate) fn updated_count(body: &Value) -> Result<u64> {
    body["updated"]
        .as_u64()
        .ok_or_else(|| DocStoreError::UnexpectedResponse("updated count missing".to_string()))
}
