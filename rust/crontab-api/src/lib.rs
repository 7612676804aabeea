//! Crontab API - control-plane gateway of the distributed crontab scheduler.
//!
//! This crate exposes the HTTP surface operators use to manage scheduled
//! jobs:
//!
//! - **Job control**: save, delete, list and kill jobs through the
//!   coordination store
//! - **Workers**: enumerate the live worker nodes
//! - **Execution history**: filtered, newest-first, paginated retrieval of
//!   execution records from the log store
//!
//! Every endpoint answers HTTP 200 with a [`envelope::ResponseEnvelope`];
//! `errno` is the only failure signal.
//!
//! # Architecture
//!
//! - [`config`]: Configuration loading and validation
//! - [`envelope`]: Uniform `{errno, msg, data}` response wrapper
//! - [`error`]: Request error taxonomy
//! - [`gateway`]: Job and worker routes
//! - [`logs`]: Execution log query engine
//! - [`api`]: Health and readiness endpoints
//! - [`server`]: Component assembly and middleware
//!
//! # Example
//!
//! ```rust,ignore
//! use crontab_api::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let app = create_app(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8070").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod logs;
pub mod server;

use std::sync::Arc;

use config::AppConfig;
use crontab_store::{JobCoordinator, LogStore};
use logs::LogQueryEngine;

/// Application state shared across all handlers.
///
/// Built once at startup; handlers receive it through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Client of the job/worker coordination service.
    pub coordinator: Arc<dyn JobCoordinator>,
    /// Execution log query engine.
    pub logs: LogQueryEngine,
}

impl AppState {
    /// Assemble the state from already connected clients.
    #[must_use]
    pub fn new(
        config: AppConfig,
        coordinator: Arc<dyn JobCoordinator>,
        log_store: Arc<dyn LogStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            coordinator,
            logs: LogQueryEngine::new(log_store),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"AppConfig")
            .field("coordinator", &self.coordinator)
            .field("logs", &self.logs)
            .finish()
    }
}
