//! Wire-level transport seam.
//!
//! [`DocStoreClient`](crate::DocStoreClient) builds requests and normalizes
//! responses; a [`Transport`] moves them over the wire. Responses are raw JSON
//! bodies.
//!
//! # Contract
//!
//! A transport returns `Ok(body)` for successful responses and for soft misses:
//! deleting a missing document (`"result": "not_found"`) and getting a missing
//! document or script (`"found": false`). Every other failure reported by the
//! store is returned as [`DocStoreError::Store`](crate::DocStoreError::Store)
//! with the store's status, error type and reason.

use crate::error::Result;
use crate::request::SearchRequestSpec;
use async_trait::async_trait;
use serde_json::Value;

mod memory;
mod opensearch_client;

pub use self::memory::MemoryTransport;
pub use self::opensearch_client::OpenSearchTransport;

/// Transport for the store operations the client depends on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create an index from a settings/mappings body.
    async fn create_index(&self, index: &str, body: Value) -> Result<Value>;

    /// Delete an index.
    async fn delete_index(&self, index: &str) -> Result<Value>;

    /// Make recent writes to an index visible to search.
    async fn refresh_index(&self, index: &str) -> Result<()>;

    /// Whether a document exists.
    async fn document_exists(&self, index: &str, id: &str) -> Result<bool>;

    /// Get a document. A missing document is `"found": false`.
    async fn get_document(&self, index: &str, id: &str) -> Result<Value>;

    /// Create or overwrite a document.
    async fn index_document(&self, index: &str, id: &str, body: Value) -> Result<Value>;

    /// Delete a document. A missing document is `"result": "not_found"`.
    async fn delete_document(&self, index: &str, id: &str) -> Result<Value>;

    /// Submit bulk request lines as one request.
    async fn bulk(&self, lines: Vec<Value>) -> Result<Value>;

    /// Run a search.
    async fn search(&self, request: &SearchRequestSpec) -> Result<Value>;

    /// Store a script or template.
    async fn put_script(&self, id: &str, body: Value) -> Result<Value>;

    /// Get a stored script. A missing script is `"found": false`.
    async fn get_script(&self, id: &str) -> Result<Value>;

    /// Delete a stored script.
    async fn delete_script(&self, id: &str) -> Result<Value>;

    /// Run a stored search template.
    async fn search_template(&self, index: &str, body: Value) -> Result<Value>;

    /// Update every document matching a query with a script.
    async fn update_by_query(&self, index: &str, body: Value) -> Result<Value>;
}
