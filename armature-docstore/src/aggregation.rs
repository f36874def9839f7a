//! Aggregation bucket and suggestion extraction.
//!
//! Searches that read aggregations or suggestions are sent with `typed_keys`,
//! so the store names each result `<type>#<name>`. Lookups accept either that
//! form or the bare name, and always check that the result has the requested
//! type before reading it.

use crate::error::{DocStoreError, LookupKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Typed-key prefix of string terms aggregations.
pub const STRING_TERMS: &str = "sterms";
/// Typed-key prefix of histogram aggregations.
pub const HISTOGRAM: &str = "histogram";
/// Typed-key prefix of completion suggestions.
pub const COMPLETION: &str = "completion";

/// One bucket of a string terms aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsBucket {
    /// Term.
    pub key: String,
    /// Documents holding the term.
    pub doc_count: u64,
}

/// One bucket of a histogram aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Lower bound of the bucket.
    pub key: f64,
    /// Documents in the bucket.
    pub doc_count: u64,
    /// Formatted key, when the aggregation sets a format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,
}

/// A named entry found in a response section.
struct Located<'a> {
    /// Type from the typed key, if the key was typed.
    kind: Option<&'a str>,
    value: &'a Value,
}

/// Find `name` among `section`'s keys, typed or not.
fn locate<'a>(section: Option<&'a Map<String, Value>>, name: &str) -> Option<Located<'a>> {
    let section = section?;

    section.iter().find_map(|(key, value)| match key.split_once('#') {
        Some((kind, n)) if n == name => Some(Located {
            kind: Some(kind),
            value,
        }),
        _ if key == name => Some(Located { kind: None, value }),
        _ => None,
    })
}

fn not_found(kind: LookupKind, name: &str) -> DocStoreError {
    DocStoreError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn wrong_kind(name: &str, expected: &str, actual: &str) -> DocStoreError {
    DocStoreError::WrongKind {
        name: name.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Look up an aggregation and check its type.
///
/// Untyped results are accepted when `shape_ok` approves their buckets.
fn aggregation<'a>(
    body: &'a Value,
    name: &str,
    expected: &str,
    shape_ok: impl Fn(&Value) -> bool,
) -> Result<Vec<(Option<&'a str>, &'a Value)>> {
    let found = locate(body["aggregations"].as_object(), name)
        .ok_or_else(|| not_found(LookupKind::Aggregation, name))?;

    if let Some(kind) = found.kind {
        if kind != expected {
            return Err(wrong_kind(name, expected, kind));
        }
    }

    let buckets = buckets(found.value)
        .ok_or_else(|| wrong_kind(name, expected, "non-bucket"))?;

    if found.kind.is_none() && !buckets.iter().all(|(_, b)| shape_ok(b)) {
        return Err(wrong_kind(name, expected, "untyped"));
    }

    Ok(buckets)
}

/// Buckets as an array, or as an object when the aggregation is `keyed`.
fn buckets(agg: &Value) -> Option<Vec<(Option<&str>, &Value)>> {
    match &agg["buckets"] {
        Value::Array(items) => Some(items.iter().map(|b| (None, b)).collect()),
        Value::Object(map) => Some(map.iter().map(|(k, b)| (Some(k.as_str()), b)).collect()),
        _ => None,
    }
}

fn doc_count(bucket: &Value) -> Result<u64> {
    bucket["doc_count"]
        .as_u64()
        .ok_or_else(|| DocStoreError::UnexpectedResponse("bucket has no doc_count".to_string()))
}

/// Buckets of the string terms aggregation `name`.
pub fn terms_buckets(body: &Value, name: &str) -> Result<Vec<TermsBucket>> {
    aggregation(body, name, STRING_TERMS, |b| b["key"].is_string())?
        .into_iter()
        .map(|(keyed, bucket)| {
            let key = keyed
                .or_else(|| bucket["key"].as_str())
                .ok_or_else(|| {
                    DocStoreError::UnexpectedResponse("terms bucket has no key".to_string())
                })?;
            Ok(TermsBucket {
                key: key.to_string(),
                doc_count: doc_count(bucket)?,
            })
        })
        .collect()
}

/// Buckets of the histogram aggregation `name`.
pub fn histogram_buckets(body: &Value, name: &str) -> Result<Vec<HistogramBucket>> {
    aggregation(body, name, HISTOGRAM, |b| b["key"].is_number())?
        .into_iter()
        .map(|(keyed, bucket)| {
            let key = bucket["key"]
                .as_f64()
                .or_else(|| keyed.and_then(|k| k.parse().ok()))
                .ok_or_else(|| {
                    let reason = "histogram bucket has no numeric key";
                    DocStoreError::UnexpectedResponse(reason.to_string())
                })?;
            Ok(HistogramBucket {
                key,
                doc_count: doc_count(bucket)?,
                key_as_string: bucket["key_as_string"].as_str().map(String::from),
            })
        })
        .collect()
}

/// Distinct option texts of the completion suggestion `name`.
///
/// Options are read from the first suggestion entry.
pub fn completion_suggestions(body: &Value, name: &str) -> Result<HashSet<String>> {
    let found = locate(body["suggest"].as_object(), name)
        .ok_or_else(|| not_found(LookupKind::Suggestion, name))?;

    if let Some(kind) = found.kind {
        if kind != COMPLETION {
            return Err(wrong_kind(name, COMPLETION, kind));
        }
    }

    let entries = found
        .value
        .as_array()
        .ok_or_else(|| {
            DocStoreError::UnexpectedResponse(format!("suggestion {} is not a list", name))
        })?;

    let Some(first) = entries.first() else {
        return Ok(HashSet::new());
    };

    Ok(first["options"]
        .as_array()
        .map(|options| {
            options
                .iter()
                .filter_map(|o| o["text"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default())
}
