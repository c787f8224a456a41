//! Error types for the block indexer

use blockidx_storage::StorageError;
use thiserror::Error;

use crate::codec::KeyError;

/// Errors returned by indexing, search, and configuration loading
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] KeyError),

    #[error("Field {0} is reserved")]
    ReservedField(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IndexError {
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery(reason.into())
    }

    /// Whether retrying the same call could succeed
    ///
    /// Only store failures and cancellation are transient; a bad query or
    /// a corrupt key fails the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Cancelled)
    }
}

/// Result type for indexer operations
pub type IndexResult<T> = Result<T, IndexError>;
