//! Document store client for the Armature framework.
//!
//! A convenience layer over an OpenSearch or Elasticsearch cluster with
//! support for:
//! - Index lifecycle management
//! - Existence-checked upserts with explicit overwrite control
//! - Bulk upserts and deletes from typed documents, JSON texts or a directory
//! - Raw JSON search with pagination and field projection
//! - Checked aggregation bucket and completion suggestion extraction
//! - Stored scripts, search templates and update-by-query
//!
//! The wire protocol sits behind the [`Transport`] trait. [`OpenSearchTransport`]
//! talks to a cluster; [`MemoryTransport`] keeps everything in process.
//!
//! # Example
//!
//! ```rust,no_run
//! use armature_docstore::{DocStoreClient, DocStoreConfig, Document, PageRequest, UpsertOutcome};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Product {
//!     id: String,
//!     title: String,
//!     price: f64,
//! }
//!
//! impl Document for Product {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DocStoreConfig::new("http://localhost:9200");
//!     let client = DocStoreClient::<Product>::connect(config)?;
//!
//!     let mapping = r#"{"mappings":{"properties":{"title":{"type":"text"}}}}"#;
//!     client.indices().create("product", mapping).await?;
//!
//!     let bread = Product {
//!         id: "1".to_string(),
//!         title: "Red bean bread".to_string(),
//!         price: 15.0,
//!     };
//!     assert_eq!(client.upsert("product", &bread, false).await?, UpsertOutcome::Created);
//!
//!     let page = client
//!         .search_with_page(
//!             "product",
//!             r#"{"query":{"match":{"title":"bread"}}}"#,
//!             &PageRequest::of(1, 10),
//!         )
//!         .await?;
//!     println!("{} of {} hits", page.number_of_elements(), page.total_hits());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod aggregation;
mod bulk;
mod client;
mod config;
mod document;
mod error;
mod index;
mod outcome;
mod page;
mod request;
mod response;
mod script;
mod search;
mod transport;

pub use aggregation::{
    completion_suggestions, histogram_buckets, terms_buckets, HistogramBucket, TermsBucket,
    COMPLETION, HISTOGRAM, STRING_TERMS,
};
pub use bulk::{BulkBatch, BulkItem, BulkItemError, BulkItemStatus, BulkOperation, BulkOutcome};
pub use client::DocStoreClient;
pub use config::{
    DocStoreConfig, NodeAddress, ENV_PASSWORD, ENV_REQUEST_TIMEOUT, ENV_URIS, ENV_USERNAME,
};
pub use document::{embedded_id, Document, DocumentBody};
pub use error::{DocStoreError, LookupKind, Result};
pub use index::IndexManager;
pub use outcome::{DeleteOutcome, UpsertOutcome};
pub use page::{Page, PageRequest, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
pub use request::SearchRequestSpec;
pub use response::{field_maps, sources, total_hits, Hit, SearchResult};
pub use script::{
    ScriptManager, ScriptTemplate, TemplateRequest, DEFAULT_LANGUAGE, MUSTACHE, SIMPLE_TEMPLATE_ID,
    SIMPLE_TEMPLATE_SOURCE,
};
pub use transport::{MemoryTransport, OpenSearchTransport, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        DocStoreClient, DocStoreConfig, DocStoreError, Document, Page, PageRequest, Result,
        ScriptTemplate, TemplateRequest, UpsertOutcome, DeleteOutcome,
    };
}
