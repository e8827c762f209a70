//! Error types for nrt-index
//!
//! Every failure is reported synchronously to the call that triggered it.
//! Nothing is retried internally.

use crate::config::ConfigError;
use thiserror::Error;

/// A key or value could not be turned into index fields (or back).
///
/// Returned directly by the [`KeyCodec`](crate::features::key_codec::KeyCodec)
/// and [`FieldSerializer`](crate::features::document::FieldSerializer) seams so
/// implementors do not need to know about the wider error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SerializationError {
    message: String,
}

impl SerializationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Main error type for repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Key or value cannot be encoded. The mutation was rejected.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The engine refused a buffered mutation. The mutation was not applied.
    #[error("Index write error: {0}")]
    IndexWrite(#[source] tantivy::TantivyError),

    /// Flush or snapshot refresh failed. Buffered mutation state is
    /// unspecified; retry the commit, not the individual mutations.
    #[error("Commit error: {0}")]
    Commit(#[source] tantivy::TantivyError),

    /// Search against a captured snapshot failed. Results already handed to
    /// the collector stand.
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// Query could not be compiled against the snapshot's schema
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Schema does not fit the repository (missing identity field, wrong kind)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Opening the index, writer or reader failed
    #[error("Open error: {0}")]
    Open(#[source] tantivy::TantivyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    /// Create a query execution error
    pub fn query(msg: impl Into<String>) -> Self {
        RepositoryError::QueryExecution(msg.into())
    }

    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        RepositoryError::Schema(msg.into())
    }
}

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;
