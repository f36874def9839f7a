//! Result codes for single-document writes.

use crate::error::{DocStoreError, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsertOutcome {
    /// The document did not exist and was written.
    Created,
    /// The document existed and was overwritten.
    Updated,
    /// The document existed and nothing was written.
    Exists,
}

impl UpsertOutcome {
    /// Wire code: `created`, `updated` or `exists`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
            UpsertOutcome::Exists => "exists",
        }
    }

    /// Read the `result` of an index response.
    pub(crate) fn from_index_response(body: &Value) -> Result<Self> {
        match body["result"].as_str() {
            Some("created") => Ok(UpsertOutcome::Created),
            Some("updated") => Ok(UpsertOutcome::Updated),
            other => Err(DocStoreError::UnexpectedResponse(format!(
                "index result {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpsertOutcome {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "created" => Ok(UpsertOutcome::Created),
            "updated" => Ok(UpsertOutcome::Updated),
            "exists" => Ok(UpsertOutcome::Exists),
            _ => Err(DocStoreError::InvalidInput(format!("unknown upsert outcome {:?}", s))),
        }
    }
}

/// Outcome of a single-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteOutcome {
    /// The document was removed.
    Deleted,
    /// There was no such document.
    NotFound,
}

impl DeleteOutcome {
    /// Wire code: `deleted` or `not_found`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted => "deleted",
            DeleteOutcome::NotFound => "not_found",
        }
    }

    pub(crate) fn from_delete_response(body: &Value) -> Result<Self> {
        body["result"]
            .as_str()
            .ok_or_else(|| DocStoreError::UnexpectedResponse("delete result missing".to_string()))?
            .parse()
            .map_err(|_| {
                DocStoreError::UnexpectedResponse(format!("delete result {}", body["result"]))
            })
    }
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeleteOutcome {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deleted" => Ok(DeleteOutcome::Deleted),
            "not_found" => Ok(DeleteOutcome::NotFound),
            _ => Err(DocStoreError::InvalidInput(format!("unknown delete outcome {:?}", s))),
        }
    }
}
