//! Document trait and body encodings.

use crate::error::{DocStoreError, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::Path;

/// Trait for documents stored by [`DocStoreClient`](crate::DocStoreClient).
///
/// The client never generates ids: every document carries its own.
///
/// # Example
///
/// ```rust
/// use armature_docstore::Document;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Product {
///     id: String,
///     title: String,
///     price: f64,
/// }
///
/// impl Document for Product {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the document id.
    fn id(&self) -> &str;
}

/// A document body in one of the accepted input shapes.
///
/// Every shape encodes to a JSON object before it is written.
#[derive(Debug)]
pub enum DocumentBody<'a, T> {
    /// Raw JSON text.
    Json(&'a str),
    /// Path to a file holding JSON.
    File(&'a Path),
    /// A typed document.
    Typed(&'a T),
}

impl<T: Serialize> DocumentBody<'_, T> {
    /// Encode the body into a JSON object.
    pub async fn encode(&self) -> Result<Value> {
        let value = match self {
            DocumentBody::Json(json) => serde_json::from_str(json)?,
            DocumentBody::File(path) => read_json_file(path).await?,
            DocumentBody::Typed(doc) => serde_json::to_value(doc)?,
        };
        ensure_object(value, "document body")
    }
}

/// Read and parse a JSON file.
pub(crate) async fn read_json_file(path: &Path) -> Result<Value> {
    if path.as_os_str().is_empty() {
        return Err(DocStoreError::InvalidInput("file path cannot be empty".to_string()));
    }
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Reject JSON that is not an object.
pub(crate) fn ensure_object(value: Value, what: &str) -> Result<Value> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(DocStoreError::InvalidInput(format!("{} must be a JSON object", what)))
    }
}

/// Read the document's own `id` field.
pub fn embedded_id(body: &Value) -> Result<String> {
    match body.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => {
            let preview: String = body.to_string().chars().take(120).collect();
            Err(DocStoreError::MissingDocumentId(preview))
        }
    }
}

/// Reject empty ids.
pub(crate) fn ensure_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(DocStoreError::InvalidInput("document id cannot be empty".to_string()));
    }
    Ok(())
}
