//! Error types for blockidx-storage
//!
//! Every backend failure is reported through [`StorageError`] with the
//! backend's own message preserved.

use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during storage operations
    #[error("I/O error: {0}")]
    Io(String),

    /// The database could not be opened or created
    #[error("Database error: {0}")]
    Database(String),

    /// A read or write transaction could not be started
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A table could not be opened
    #[error("Table error: {0}")]
    Table(String),

    /// Committing a write transaction failed; nothing from it is visible
    #[error("Commit error: {0}")]
    Commit(String),

    /// Reading or iterating stored entries failed
    #[error("Read error: {0}")]
    Read(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Transaction(err.to_string())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::Table(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Commit(err.to_string())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::Read(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
        assert!(storage_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_commit_error_message() {
        let err = StorageError::Commit("disk full".into());
        assert_eq!(err.to_string(), "Commit error: disk full");
    }
}
