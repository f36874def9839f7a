//! Error types for document store operations.

use std::fmt;
use thiserror::Error;

/// What a checked lookup in a search response was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// A named aggregation.
    Aggregation,
    /// A named suggestion.
    Suggestion,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Aggregation => write!(f, "aggregation"),
            LookupKind::Suggestion => write!(f, "suggestion"),
        }
    }
}

/// Document store error type.
#[derive(Error, Debug)]
pub enum DocStoreError {
    /// Reading a mapping or document file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller input rejected before contacting the store.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A bulk document body has no usable `id` field.
    #[error("Document has no string `id` field: {0}")]
    MissingDocumentId(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A named aggregation or suggestion is absent from the response.
    #[error("{kind} not found in response: {name}")]
    NotFound {
        /// What was looked up.
        kind: LookupKind,
        /// Name requested by the caller.
        name: String,
    },

    /// A named aggregation or suggestion exists but has another type.
    #[error("`{name}` is a {actual} result, expected {expected}")]
    WrongKind {
        /// Name requested by the caller.
        name: String,
        /// Type the caller asked for.
        expected: String,
        /// Type reported by the store.
        actual: String,
    },

    /// Failure reported by the store, carried verbatim.
    #[error("Store error ({status}) {error_type}: {reason}")]
    Store {
        /// HTTP status code.
        status: u16,
        /// Store error type, e.g. `index_not_found_exception`.
        error_type: String,
        /// Store error reason.
        reason: String,
    },

    /// The response lacks an element this client depends on.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Bulk operation error.
    #[error("Bulk operation failed: {succeeded} succeeded, {failed} failed")]
    BulkError {
        /// Number of successful operations.
        succeeded: usize,
        /// Number of failed operations.
        failed: usize,
        /// Error details.
        errors: Vec<String>,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Client error from opensearch crate.
    #[error("Client error: {0}")]
    Client(#[from] opensearch::Error),
}

impl DocStoreError {
    /// Build a store error from a response body's `error` object.
    pub fn from_store_body(status: u16, body: &serde_json::Value) -> Self {
        let error = &body["error"];
        // Some endpoints report `error` as a bare string.
        if let Some(reason) = error.as_str() {
            return DocStoreError::Store {
                status,
                error_type: String::new(),
                reason: reason.to_string(),
            };
        }
        DocStoreError::Store {
            status,
            error_type: error["type"].as_str().unwrap_or("unknown").to_string(),
            reason: error["reason"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string(),
        }
    }

    /// True for absent-name lookups.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocStoreError::NotFound { .. })
    }

    /// True for transport, serialization and rejected-input failures.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            DocStoreError::Io(_)
                | DocStoreError::InvalidInput(_)
                | DocStoreError::MissingDocumentId(_)
                | DocStoreError::Serialization(_)
                | DocStoreError::Connection(_)
                | DocStoreError::Client(_)
        )
    }
}

/// Result type alias for document store operations.
pub type Result<T> = std::result::Result<T, DocStoreError>;
