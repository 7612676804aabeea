//! Uniform response envelope.
//!
//! Every endpoint answers with
//!
//! ```json
//! {"errno": 0, "msg": "success", "data": ...}
//! ```
//!
//! on success, and `{"errno": -1, "msg": "<cause>", "data": null}` on
//! failure. The HTTP status is always 200.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// `errno` of a successful call.
pub const ERRNO_OK: i32 = 0;

/// `errno` of a failed call.
pub const ERRNO_FAILURE: i32 = -1;

/// `msg` of a successful call.
pub const SUCCESS_MSG: &str = "success";

/// Response wrapper shared by all endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    /// `0` on success, `-1` on failure.
    pub errno: i32,
    /// `"success"`, or the failure cause.
    pub msg: String,
    /// Endpoint payload; always `null` on failure.
    pub data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    /// Successful envelope carrying `data` (`null` when `None`).
    #[must_use]
    pub fn success(data: Option<T>) -> Self {
        Self {
            errno: ERRNO_OK,
            msg: SUCCESS_MSG.to_string(),
            data,
        }
    }

    /// Failed envelope with the given cause.
    #[must_use]
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            errno: ERRNO_FAILURE,
            msg: msg.into(),
            data: None,
        }
    }

    /// Whether the envelope reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errno == ERRNO_OK
    }
}

impl<T: Serialize> IntoResponse for ResponseEnvelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_with_null_data() {
        let envelope = ResponseEnvelope::<String>::success(None);
        assert!(envelope.is_success());
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"errno": 0, "msg": "success", "data": null})
        );
    }

    #[test]
    fn test_success_with_empty_sequence() {
        let envelope = ResponseEnvelope::success(Some(Vec::<String>::new()));
        assert_eq!(serde_json::to_value(&envelope).unwrap()["data"], json!([]));
    }

    #[test]
    fn test_failure_has_null_data() {
        let envelope = ResponseEnvelope::<Vec<String>>::failure("connection refused");
        assert!(!envelope.is_success());
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"errno": -1, "msg": "connection refused", "data": null})
        );
    }

    #[test]
    fn test_failure_is_http_ok() {
        let response = ResponseEnvelope::<()>::failure("boom").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
