//! Error type shared by the coordination and log-store clients.

use thiserror::Error;

/// Errors raised by the storage clients.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The coordination store rejected or could not complete an operation.
    #[error("coordination store error: {0}")]
    Coordination(String),

    /// A log query could not be executed against the document store.
    #[error("log query failed: {0}")]
    Query(String),

    /// Writing execution records to the document store failed.
    #[error("log write failed: {0}")]
    Write(String),

    /// A stored document could not be decoded.
    #[error("malformed log record: {0}")]
    Decode(String),

    /// A value could not be encoded for storage.
    #[error("failed to encode {what}: {reason}")]
    Encode { what: &'static str, reason: String },

    /// The initial connection did not complete in time.
    #[error("connection to {service} timed out after {timeout_ms}ms")]
    ConnectTimeout {
        service: &'static str,
        timeout_ms: u64,
    },
}

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(feature = "redis-backend")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Coordination(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Query(format!("blocking task failed: {err}"))
    }
}
