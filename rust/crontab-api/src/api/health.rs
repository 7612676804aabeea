//! Health check endpoints.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::envelope::ResponseEnvelope;
use crate::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness: the process is up and serving.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Backends reached by the readiness check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    coordination: &'static str,
    log_store: &'static str,
}

/// Readiness: both backing stores answer.
///
/// Reported with the regular envelope; a failed check sets `errno = -1` and
/// names the unreachable stores in `msg`.
async fn readiness_check(State(state): State<AppState>) -> ResponseEnvelope<ReadinessResponse> {
    let (coordination, log_store) =
        tokio::join!(state.coordinator.list_workers(), state.logs.ping());

    let mut failures = Vec::new();
    if let Err(e) = coordination {
        failures.push(format!("coordination: {e}"));
    }
    if let Err(e) = log_store {
        failures.push(format!("log store: {e}"));
    }

    if failures.is_empty() {
        ResponseEnvelope::success(Some(ReadinessResponse {
            coordination: "ok",
            log_store: "ok",
        }))
    } else {
        tracing::warn!(failures = ?failures, "Readiness check failed");
        ResponseEnvelope::failure(failures.join("; "))
    }
}
