//! Worker listing endpoint.

use axum::{extract::State, routing::get, Router};

use crate::envelope::ResponseEnvelope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Worker routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/worker/list", get(list_workers))
}

/// Identities of the currently registered workers.
pub async fn list_workers(
    State(state): State<AppState>,
) -> ApiResult<ResponseEnvelope<Vec<String>>> {
    let workers = state
        .coordinator
        .list_workers()
        .await
        .map_err(ApiError::Coordination)?;

    Ok(ResponseEnvelope::success(Some(workers)))
}
