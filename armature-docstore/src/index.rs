//! Index lifecycle management.

use crate::document::{ensure_object, read_json_file};
use crate::error::{DocStoreError, Result};
use crate::response::acknowledged;
use crate::transport::Transport;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Index manager for creating and managing indices.
#[derive(Clone)]
pub struct IndexManager {
    transport: Arc<dyn Transport>,
}

impl IndexManager {
    /// Create a new index manager.
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Check if an index exists. An empty name never exists.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        debug!(index = name, "Checking if index exists");
        self.transport.index_exists(name).await
    }

    /// Create an index from a settings/mappings JSON body.
    ///
    /// Returns the store's acknowledgement.
    pub async fn create(&self, name: &str, mapping_json: &str) -> Result<bool> {
        let body: Value = serde_json::from_str(mapping_json)?;
        self.create_with_body(name, body).await
    }

    /// Create an index from a JSON file holding its settings/mappings.
    pub async fn create_from_file(&self, name: &str, path: impl AsRef<Path>) -> Result<bool> {
        let body = read_json_file(path.as_ref()).await?;
        self.create_with_body(name, body).await
    }

    async fn create_with_body(&self, name: &str, body: Value) -> Result<bool> {
        if name.is_empty() {
            return Err(DocStoreError::InvalidInput("index name cannot be empty".to_string()));
        }
        let body = ensure_object(body, "index mapping")?;

        info!(index = name, "Creating index");
        let response = self.transport.create_index(name, body).await?;
        acknowledged(&response)
    }

    /// Delete an index.
    ///
    /// Returns `false` without contacting the store again when the index does
    /// not exist.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        if !self.exists(name).await? {
            debug!(index = name, "Index absent, nothing to delete");
            return Ok(false);
        }

        info!(index = name, "Deleting index");
        let response = self.transport.delete_index(name).await?;
        acknowledged(&response)
    }

    /// Make recent writes visible to search.
    pub async fn refresh(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(DocStoreError::InvalidInput("index name cannot be empty".to_string()));
        }
        debug!(index = name, "Refreshing index");
        self.transport.refresh_index(name).await
    }
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager").finish_non_exhaustive()
    }
}
