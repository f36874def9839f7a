//! Transport backed by the `opensearch` crate.

use super::Transport;
use crate::config::DocStoreConfig;
use crate::error::{DocStoreError, Result};
use crate::request::SearchRequestSpec;
use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
        StatusCode, Url,
    },
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesRefreshParts},
    BulkParts, DeleteParts, DeleteScriptParts, ExistsParts, GetParts, GetScriptParts, IndexParts,
    OpenSearch, PutScriptParts, SearchParts, SearchTemplateParts, UpdateByQueryParts,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transport that talks to an OpenSearch or Elasticsearch cluster over HTTP.
#[derive(Clone)]
pub struct OpenSearchTransport {
    client: Arc<OpenSearch>,
    config: Arc<DocStoreConfig>,
}

impl OpenSearchTransport {
    /// Create a transport from configuration.
    ///
    /// Every configured URI is validated; requests go to the first node.
    pub fn new(config: DocStoreConfig) -> Result<Self> {
        info!(urls = ?config.urls, "Initializing document store transport");

        let nodes = config.nodes()?;
        if nodes.len() > 1 {
            warn!(
                nodes = nodes.len(),
                "Single-node connection pool, only {} is used",
                nodes[0]
            );
        }

        let url = Url::parse(&nodes[0].url())
            .map_err(|e| DocStoreError::Configuration(format!("Invalid URL: {}", e)))?;

        let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(url))
            .timeout(config.request_timeout)
            .disable_proxy();

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.auth(Credentials::Basic(user.clone(), pass.clone()));
        }

        #[cfg(any(feature = "rustls", feature = "native-tls"))]
        if config.danger_accept_invalid_certs {
            builder = builder.cert_validation(opensearch::cert::CertificateValidation::None);
        }

        let transport = builder
            .build()
            .map_err(|e| DocStoreError::Connection(e.to_string()))?;

        debug!("Document store transport initialized");

        Ok(Self {
            client: Arc::new(OpenSearch::new(transport)),
            config: Arc::new(config),
        })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: OpenSearch, config: DocStoreConfig) -> Self {
        Self {
            client: Arc::new(client),
            config: Arc::new(config),
        }
    }

    /// Get the underlying OpenSearch client.
    pub fn inner(&self) -> &OpenSearch {
        &self.client
    }

    /// Get the configuration.
    pub fn config(&self) -> &DocStoreConfig {
        &self.config
    }
}

/// Read a response body, turning store failures into errors.
///
/// With `soft_miss`, a 404 that carries no `error` object is a normal answer.
async fn read_body(response: Response, soft_miss: bool) -> Result<Value> {
    let status = response.status_code();
    let text = response.text().await?;

    let body: Value = if text.trim().is_empty() {
        json!({})
    } else {
        match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => json!({ "error": text }),
            Err(e) => return Err(e.into()),
        }
    };

    if status.is_success()
        || (soft_miss && status == StatusCode::NOT_FOUND && body.get("error").is_none())
    {
        return Ok(body);
    }

    Err(DocStoreError::from_store_body(status.as_u16(), &body))
}

/// Interpret a HEAD response: 2xx is true, 404 is false.
fn head_result(response: &Response, what: &str) -> Result<bool> {
    let status = response.status_code();
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        Err(DocStoreError::Store {
            status: status.as_u16(),
            error_type: String::new(),
            reason: format!("{} check failed", what),
        })
    }
}

#[async_trait]
impl Transport for OpenSearchTransport {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await?;

        head_result(&response, "index existence")
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn delete_index(&self, index: &str) -> Result<Value> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn refresh_index(&self, index: &str) -> Result<()> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await?;

        read_body(response, false).await.map(|_| ())
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool> {
        let response = self
            .client
            .exists(ExistsParts::IndexId(index, id))
            .send()
            .await?;

        head_result(&response, "document existence")
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Value> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await?;

        read_body(response, true).await
    }

    async fn index_document(&self, index: &str, id: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(body)
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<Value> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .send()
            .await?;

        read_body(response, true).await
    }

    async fn bulk(&self, lines: Vec<Value>) -> Result<Value> {
        let body: Vec<JsonBody<Value>> = lines.into_iter().map(JsonBody::from).collect();

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(body)
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn search(&self, request: &SearchRequestSpec) -> Result<Value> {
        let response = self
            .client
            .search(SearchParts::Index(&[request.index.as_str()]))
            .ignore_unavailable(request.ignore_unavailable)
            .typed_keys(request.typed_keys)
            .body(request.body())
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn put_script(&self, id: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .put_script(PutScriptParts::Id(id))
            .body(body)
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn get_script(&self, id: &str) -> Result<Value> {
        let response = self
            .client
            .get_script(GetScriptParts::Id(id))
            .send()
            .await?;

        read_body(response, true).await
    }

    async fn delete_script(&self, id: &str) -> Result<Value> {
        let response = self
            .client
            .delete_script(DeleteScriptParts::Id(id))
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn search_template(&self, index: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .search_template(SearchTemplateParts::Index(&[index]))
            .body(body)
            .send()
            .await?;

        read_body(response, false).await
    }

    async fn update_by_query(&self, index: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .update_by_query(UpdateByQueryParts::Index(&[index]))
            .body(body)
            .send()
            .await?;

        read_body(response, false).await
    }
}

impl std::fmt::Debug for OpenSearchTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchTransport")
            .field("urls", &self.config.urls)
            .finish()
    }
}
