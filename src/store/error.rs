//! Error types for store operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a [`Store`](super::Store) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Error reported by the backing store (connection refused, protocol error, ...)
    #[error("{0}")]
    Backend(String),

    /// Operation against a key holding the wrong kind of value
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// The store did not answer in time
    #[error("store did not respond within {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}
