//! Bulk batches and bulk responses.

use crate::error::{DocStoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Bulk operation type.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Index (create or overwrite) a document.
    Index {
        /// Document ID.
        id: String,
        /// Document body.
        source: Value,
    },
    /// Delete a document.
    Delete {
        /// Document ID.
        id: String,
    },
}

impl BulkOperation {
    /// Document ID this operation targets.
    pub fn id(&self) -> &str {
        match self {
            BulkOperation::Index { id, .. } | BulkOperation::Delete { id } => id,
        }
    }

    /// Convert to bulk request lines.
    pub fn to_bulk_lines(&self, index: &str) -> Vec<Value> {
        match self {
            BulkOperation::Index { id, source } => vec![
                json!({ "index": { "_index": index, "_id": id } }),
                source.clone(),
            ],
            BulkOperation::Delete { id } => {
                vec![json!({ "delete": { "_index": index, "_id": id } })]
            }
        }
    }
}

/// An ordered batch of operations against one index, sent as one request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkBatch {
    index: String,
    operations: Vec<BulkOperation>,
}

impl BulkBatch {
    /// Create an empty batch.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            operations: Vec::new(),
        }
    }

    /// Append an index operation.
    pub fn index(mut self, id: impl Into<String>, source: Value) -> Self {
        self.operations.push(BulkOperation::Index {
            id: id.into(),
            source,
        });
        self
    }

    /// Append a delete operation.
    pub fn delete(mut self, id: impl Into<String>) -> Self {
        self.operations.push(BulkOperation::Delete { id: id.into() });
        self
    }

    /// Target index.
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Operations in submission order.
    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the batch holds no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Request body lines, action line followed by source line where needed.
    pub fn to_lines(&self) -> Vec<Value> {
        self.operations
            .iter()
            .flat_map(|op| op.to_bulk_lines(&self.index))
            .collect()
    }
}

/// Bulk operation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// Time taken in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Whether any item failed.
    pub errors: bool,
    /// Individual item results, one per submitted operation.
    pub items: Vec<BulkItem>,
}

impl BulkOutcome {
    /// Parse a bulk response and check it answers every operation.
    pub(crate) fn from_response(body: Value, submitted: usize) -> Result<Self> {
        let outcome: BulkOutcome = serde_json::from_value(body)?;
        if outcome.items.len() != submitted {
            return Err(DocStoreError::UnexpectedResponse(format!(
                "bulk response has {} items for {} operations",
                outcome.items.len(),
                submitted
            )));
        }
        Ok(outcome)
    }

    /// Number of item results.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no item results.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items that carry an error.
    pub fn failures(&self) -> impl Iterator<Item = &BulkItemStatus> {
        self.items
            .iter()
            .map(BulkItem::status)
            .filter(|s| s.error.is_some())
    }

    /// Number of items without an error.
    pub fn succeeded(&self) -> usize {
        self.items.len() - self.failures().count()
    }

    /// Turn item failures into a [`DocStoreError::BulkError`].
    pub fn into_result(self) -> Result<Self> {
        let errors: Vec<String> = self
            .failures()
            .filter_map(|s| s.error.as_ref())
            .map(|e| e.reason.clone())
            .collect();

        if errors.is_empty() {
            return Ok(self);
        }

        Err(DocStoreError::BulkError {
            succeeded: self.items.len() - errors.len(),
            failed: errors.len(),
            errors,
        })
    }
}

/// Bulk item result, keyed by operation type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkItem {
    /// Index result.
    Index(BulkItemStatus),
    /// Create result.
    Create(BulkItemStatus),
    /// Update result.
    Update(BulkItemStatus),
    /// Delete result.
    Delete(BulkItemStatus),
}

impl BulkItem {
    /// Status regardless of operation type.
    pub fn status(&self) -> &BulkItemStatus {
        match self {
            BulkItem::Index(s)
            | BulkItem::Create(s)
            | BulkItem::Update(s)
            | BulkItem::Delete(s) => s,
        }
    }
}

/// Status of a bulk item operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemStatus {
    /// Index name.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Document ID.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Document version.
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    /// Result status, e.g. `created` or `not_found`.
    #[serde(default)]
    pub result: Option<String>,
    /// HTTP status code.
    pub status: u16,
    /// Error details.
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

/// Bulk item error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error reason.
    #[serde(default)]
    pub reason: String,
}

impl BulkItemStatus {
    /// Check if the operation was successful.
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
