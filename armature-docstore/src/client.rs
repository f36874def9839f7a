//! Document store client.

use crate::{
    bulk::{BulkBatch, BulkOutcome},
    config::DocStoreConfig,
    document::{embedded_id, ensure_id, ensure_object, read_json_file, Document, DocumentBody},
    error::{DocStoreError, Result},
    index::IndexManager,
    outcome::{DeleteOutcome, UpsertOutcome},
    response::{found, updated_count},
    script::ScriptManager,
    transport::{OpenSearchTransport, Transport},
};
use serde_json::Value;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client for one document type `T`.
///
/// Holds a single transport handle acquired at construction. Cloning is
/// cheap and clones share the handle.
pub struct DocStoreClient<T> {
    pub(crate) transport: Arc<dyn Transport>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DocStoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            _marker: PhantomData,
        }
    }
}

/// Reject empty index names on write paths.
pub(crate) fn ensure_index(index: &str) -> Result<()> {
    if index.is_empty() {
        return Err(DocStoreError::InvalidInput("index name cannot be empty".to_string()));
    }
    Ok(())
}

impl<T: Document> DocStoreClient<T> {
    /// Create a client over a transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_transport(Arc::new(transport))
    }

    /// Create a client over a shared transport.
    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            _marker: PhantomData,
        }
    }

    /// Connect to a cluster.
    pub fn connect(config: DocStoreConfig) -> Result<Self> {
        Ok(Self::new(OpenSearchTransport::new(config)?))
    }

    /// Get the transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Get an index manager for index operations.
    pub fn indices(&self) -> IndexManager {
        IndexManager::new(self.transport.clone())
    }

    /// Get a script manager for stored scripts and templates.
    pub fn scripts(&self) -> ScriptManager {
        ScriptManager::new(self.transport.clone())
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Check if a document exists. An empty index or id is never found.
    pub async fn document_exists(&self, index: &str, id: &str) -> Result<bool> {
        if index.is_empty() || id.is_empty() {
            return Ok(false);
        }
        debug!(index, id, "Checking if document exists");
        self.transport.document_exists(index, id).await
    }

    /// Get a document by id.
    pub async fn get(&self, index: &str, id: &str) -> Result<Option<T>> {
        if index.is_empty() || id.is_empty() {
            return Ok(None);
        }
        debug!(index, id, "Getting document");

        let body = self.transport.get_document(index, id).await?;
        if !found(&body) {
            return Ok(None);
        }

        let source = body
            .get("_source")
            .ok_or_else(|| {
                DocStoreError::UnexpectedResponse("No _source in response".to_string())
            })?;
        Ok(Some(serde_json::from_value(source.clone())?))
    }

    /// Delete a document by id. A missing document is [`DeleteOutcome::NotFound`].
    pub async fn delete(&self, index: &str, id: &str) -> Result<DeleteOutcome> {
        ensure_index(index)?;
        ensure_id(id)?;
        debug!(index, id, "Deleting document");

        let body = self.transport.delete_document(index, id).await?;
        DeleteOutcome::from_delete_response(&body)
    }

    /// Delete many documents in one bulk request, in input order.
    pub async fn delete_bulk<I, S>(&self, index: &str, ids: I) -> Result<BulkOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ensure_index(index)?;
        let mut batch = BulkBatch::new(index);
        for id in ids {
            let id = id.into();
            ensure_id(&id)?;
            batch = batch.delete(id);
        }
        self.submit_bulk(batch).await
    }

    /// Upsert a document from JSON text.
    ///
    /// An existing document is left alone unless `force` is set.
    pub async fn upsert_json(
        &self,
        index: &str,
        json: &str,
        id: &str,
        force: bool,
    ) -> Result<UpsertOutcome> {
        self.upsert_body(index, id, DocumentBody::Json(json), force).await
    }

    /// Upsert a document from a JSON file.
    pub async fn upsert_file(
        &self,
        index: &str,
        path: impl AsRef<Path>,
        id: &str,
        force: bool,
    ) -> Result<UpsertOutcome> {
        self.upsert_body(index, id, DocumentBody::File(path.as_ref()), force).await
    }

    /// Upsert a typed document under its own id.
    pub async fn upsert(&self, index: &str, doc: &T, force: bool) -> Result<UpsertOutcome> {
        self.upsert_body(index, doc.id(), DocumentBody::Typed(doc), force).await
    }

    async fn upsert_body(
        &self,
        index: &str,
        id: &str,
        body: DocumentBody<'_, T>,
        force: bool,
    ) -> Result<UpsertOutcome> {
        ensure_index(index)?;
        ensure_id(id)?;
        let source = body.encode().await?;

        if self.transport.document_exists(index, id).await? && !force {
            debug!(index, id, "Document exists, skipping write");
            return Ok(UpsertOutcome::Exists);
        }

        debug!(index, id, force, "Writing document");
        let response = self.transport.index_document(index, id, source).await?;
        UpsertOutcome::from_index_response(&response)
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Bulk index every `.json` file directly inside `dir`.
    ///
    /// Files are processed in file-name order and each body's own `id` field is
    /// its document id.
    pub async fn upsert_bulk_from_dir(
        &self,
        index: &str,
        dir: impl AsRef<Path>,
    ) -> Result<BulkOutcome> {
        let dir = dir.as_ref();
        ensure_index(index)?;
        if dir.as_os_str().is_empty() {
            return Err(DocStoreError::InvalidInput("directory path cannot be empty".to_string()));
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_json = entry.file_name().to_string_lossy().ends_with(".json");
            if is_json && entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(DocStoreError::InvalidInput(format!(
                "no .json files in {}",
                dir.display()
            )));
        }
        debug!(index, count = files.len(), dir = %dir.display(), "Bulk loading JSON files");

        let mut batch = BulkBatch::new(index);
        for file in &files {
            let source = ensure_object(read_json_file(file).await?, "document body")?;
            batch = batch.index(embedded_id(&source)?, source);
        }
        self.submit_bulk(batch).await
    }

    /// Bulk index JSON texts, each carrying its own `id` field.
    pub async fn upsert_bulk_json<S: AsRef<str>>(
        &self,
        index: &str,
        jsons: &[S],
    ) -> Result<BulkOutcome> {
        ensure_index(index)?;
        if jsons.is_empty() {
            return Err(DocStoreError::InvalidInput("bulk JSON list cannot be empty".to_string()));
        }

        let mut batch = BulkBatch::new(index);
        for json in jsons {
            let source = ensure_object(serde_json::from_str(json.as_ref())?, "document body")?;
            batch = batch.index(embedded_id(&source)?, source);
        }
        self.submit_bulk(batch).await
    }

    /// Bulk index typed documents under their own ids.
    pub async fn upsert_bulk(&self, index: &str, docs: &[T]) -> Result<BulkOutcome> {
        ensure_index(index)?;
        if docs.is_empty() {
            return Err(DocStoreError::InvalidInput(
                "bulk document list cannot be empty".to_string(),
            ));
        }

        let mut batch = BulkBatch::new(index);
        for doc in docs {
            ensure_id(doc.id())?;
            batch = batch.index(doc.id(), serde_json::to_value(doc)?);
        }
        self.submit_bulk(batch).await
    }

    /// Submit a prepared batch as one request.
    pub async fn submit_bulk(&self, batch: BulkBatch) -> Result<BulkOutcome> {
        if batch.is_empty() {
            return Err(DocStoreError::InvalidInput("bulk batch cannot be empty".to_string()));
        }
        debug!(index = batch.index_name(), count = batch.len(), "Submitting bulk request");

        let body = self.transport.bulk(batch.to_lines()).await?;
        let outcome = BulkOutcome::from_response(body, batch.len())?;

        if outcome.errors {
            warn!(
                index = batch.index_name(),
                failed = outcome.failures().count(),
                succeeded = outcome.succeeded(),
                "Bulk request had item failures"
            );
        }
        Ok(outcome)
    }

    // =========================================================================
    // Update By Query
    // =========================================================================

    /// Run a combined query and script update, returning the updated count.
    ///
    /// Script ids are resolved by the store.
    pub async fn update_by_query(&self, index: &str, json: &str) -> Result<u64> {
        ensure_index(index)?;
        let body: Value = ensure_object(serde_json::from_str(json)?, "update-by-query body")?;

        let response = self.transport.update_by_query(index, body).await?;
        let updated = updated_count(&response)?;
        info!(index, updated, "Updated documents by query");
        Ok(updated)
    }
}

impl<T> std::fmt::Debug for DocStoreClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocStoreClient").finish_non_exhaustive()
    }
}
