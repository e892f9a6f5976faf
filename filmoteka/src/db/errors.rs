//! Store error types.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by an [`AuthRepository`](super::AuthRepository).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No matching row (or the session has expired)
    #[error("Record not found")]
    NotFound,

    /// Unique constraint violated
    #[error("Duplicate key")]
    Duplicate,

    /// Operation did not complete within the query timeout
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored data could not be mapped back into a model
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Any other driver error
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate
            }
            other => StoreError::Database(other),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
