//! Request error taxonomy.
//!
//! Every variant is terminal for the request and is rendered as a failure
//! envelope. Undecodable log records never become an `ApiError`; the query
//! engine drops them.

use axum::response::{IntoResponse, Response};
use crontab_store::StoreError;
use thiserror::Error;

use crate::envelope::ResponseEnvelope;

/// Errors that end a request with a failure envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request payload could not be deserialized or is incomplete.
    #[error("invalid job payload: {0}")]
    Deserialization(String),

    /// The coordination service rejected or could not complete the call.
    #[error(transparent)]
    Coordination(StoreError),

    /// The log query could not run against the document store.
    #[error(transparent)]
    StoreQuery(StoreError),
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Short category name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Deserialization(_) => "deserialization",
            ApiError::Coordination(_) => "coordination",
            ApiError::StoreQuery(_) => "store_query",
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(kind = self.kind(), error = %self, "Request failed");
        ResponseEnvelope::<()>::failure(self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialization_from_serde() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "deserialization");
        assert!(err.to_string().starts_with("invalid job payload"));
    }

    #[test]
    fn test_store_errors_keep_their_message() {
        let err = ApiError::Coordination(StoreError::Coordination("timeout".to_string()));
        assert_eq!(err.to_string(), "coordination store error: timeout");

        let err = ApiError::StoreQuery(StoreError::Query("disk I/O error".to_string()));
        assert_eq!(err.kind(), "store_query");
        assert_eq!(err.to_string(), "log query failed: disk I/O error");
    }
}
