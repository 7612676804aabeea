//! Job control gateway.
//!
//! Translates HTTP requests into coordination and log store calls, one call
//! per endpoint, with no state kept between requests:
//! - Job save, delete, list and kill
//! - Execution log pages
//! - Worker listing

pub mod jobs;
pub mod workers;

use axum::Router;

use crate::AppState;

/// Create the gateway router with all job and worker routes.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(jobs::router())
        .merge(workers::router())
}
