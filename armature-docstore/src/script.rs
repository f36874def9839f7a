//! Stored scripts and search templates.

use crate::{
    client::{ensure_index, DocStoreClient},
    document::Document,
    error::{DocStoreError, Result},
    response::{acknowledged, found, SearchResult},
    transport::Transport,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Id of the built-in single-field match template.
pub const SIMPLE_TEMPLATE_ID: &str = "docstore-simple-match";

/// Source of the built-in template. Params: `field`, `value`.
pub const SIMPLE_TEMPLATE_SOURCE: &str = r#"{"query":{"match":{"{{field}}":"{{value}}"}}}"#;

/// Language used when a script does not name one.
pub const DEFAULT_LANGUAGE: &str = "painless";

/// Language of search templates.
pub const MUSTACHE: &str = "mustache";

/// A stored script or search template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTemplate {
    /// Script id.
    pub id: String,
    /// Script source.
    pub source: String,
    /// Script language.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl ScriptTemplate {
    /// Create a painless script.
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            language: default_language(),
        }
    }

    /// Create a mustache search template.
    pub fn mustache(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(id, source).with_language(MUSTACHE)
    }

    /// Set the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// The built-in single-field match template.
    pub fn simple_match() -> Self {
        Self::mustache(SIMPLE_TEMPLATE_ID, SIMPLE_TEMPLATE_SOURCE)
    }

    /// Body of the put-script request. An empty language becomes `painless`.
    pub fn to_body(&self) -> Value {
        let lang = if self.language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            self.language.as_str()
        };
        json!({
            "script": {
                "lang": lang,
                "source": self.source
            }
        })
    }
}

/// Parameters for running a stored search template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRequest {
    /// Index to search.
    pub index: String,
    /// Template id.
    pub id: String,
    /// Template parameters.
    pub params: Map<String, Value>,
}

impl TemplateRequest {
    /// Create a request without parameters.
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            params: Map::new(),
        }
    }

    /// Add a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Body of the search-template request.
    pub fn to_body(&self) -> Value {
        json!({
            "id": self.id,
            "params": self.params
        })
    }
}

/// Manager for stored scripts and templates.
#[derive(Clone)]
pub struct ScriptManager {
    transport: Arc<dyn Transport>,
}

impl ScriptManager {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Check if a script exists. An empty id never exists.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Ok(false);
        }
        debug!(script = id, "Checking if script exists");
        let body = self.transport.get_script(id).await?;
        Ok(found(&body))
    }

    /// Get a stored script.
    pub async fn get(&self, id: &str) -> Result<Option<ScriptTemplate>> {
        if id.is_empty() {
            return Ok(None);
        }
        let body = self.transport.get_script(id).await?;
        if !found(&body) {
            return Ok(None);
        }

        let script = &body["script"];
        let source = script["source"]
            .as_str()
            .ok_or_else(|| {
                DocStoreError::UnexpectedResponse(format!("script {} has no source", id))
            })?;
        Ok(Some(ScriptTemplate {
            id: id.to_string(),
            source: source.to_string(),
            language: script["lang"].as_str().unwrap_or(DEFAULT_LANGUAGE).to_string(),
        }))
    }

    /// Store a script.
    ///
    /// An existing script is replaced only with `force`; otherwise nothing is
    /// written and `false` is returned.
    pub async fn create(&self, script: &ScriptTemplate, force: bool) -> Result<bool> {
        if script.id.is_empty() {
            return Err(DocStoreError::InvalidInput("script id cannot be empty".to_string()));
        }
        if script.source.is_empty() {
            return Err(DocStoreError::InvalidInput("script source cannot be empty".to_string()));
        }

        if self.exists(&script.id).await? {
            if !force {
                debug!(script = %script.id, "Script exists, skipping");
                return Ok(false);
            }
            self.transport.delete_script(&script.id).await?;
        }

        info!(script = %script.id, lang = %script.language, "Storing script");
        let response = self.transport.put_script(&script.id, script.to_body()).await?;
        acknowledged(&response)
    }

    /// Delete a script. Returns `false` when it does not exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        if !self.exists(id).await? {
            return Ok(false);
        }

        info!(script = id, "Deleting script");
        let response = self.transport.delete_script(id).await?;
        acknowledged(&response)
    }

    /// Store the built-in match template unless it is already present.
    pub async fn ensure_simple_template(&self) -> Result<()> {
        self.create(&ScriptTemplate::simple_match(), false).await.map(|_| ())
    }
}

impl std::fmt::Debug for ScriptManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptManager").finish_non_exhaustive()
    }
}

impl<T: Document> DocStoreClient<T> {
    /// Run the stored search template named by `request`.
    pub async fn search_by_template(&self, request: &TemplateRequest) -> Result<Vec<T>> {
        ensure_index(&request.index)?;
        if request.id.is_empty() {
            return Err(DocStoreError::InvalidInput("template id cannot be empty".to_string()));
        }
        if request.id == SIMPLE_TEMPLATE_ID {
            self.scripts().ensure_simple_template().await?;
        }

        debug!(index = %request.index, template = %request.id, "Executing template search");
        let body = self
            .transport
            .search_template(&request.index, request.to_body())
            .await?;
        Ok(SearchResult::<T>::from_response(&body)?.into_documents())
    }

    /// Match `value` against `field` through the built-in template.
    pub async fn search_by_simple_template(
        &self,
        index: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>> {
        let request = TemplateRequest::new(index, SIMPLE_TEMPLATE_ID)
            .param("field", field)
            .param("value", value);
        self.search_by_template(&request).await
    }
}
