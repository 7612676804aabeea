//! HTTP server setup and middleware.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderName, Method};
use axum::Router;
use crontab_store::{
    InMemoryCoordinator, InMemoryLogStore, JobCoordinator, LogStore, RedisCoordinator,
    SqliteLogStore,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::config::{AppConfig, CoordinationBackend, CorsConfig, LogStoreBackend};
use crate::gateway;
use crate::logging::OpTimer;
use crate::{log_banner, log_init_step, log_init_warning, log_success, AppState};

/// Crontab API version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Connect the stores and build the application with all routes and
/// middleware.
pub async fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");

    log_banner!(
        format!("Crontab API v{VERSION}"),
        format!(
            "Coordination: {} | Log store: {}",
            config.coordination.backend, config.log_store.backend
        )
    );

    // [1/3] Coordination store
    let coordinator = connect_coordinator(&config).await?;

    // [2/3] Log store
    let log_store = open_log_store(&config).await?;

    // [3/3] Router
    let step_timer = OpTimer::new("server", "router");
    let app = build_router(AppState::new(config, coordinator, log_store));
    log_init_step!(3, 3, "Router", "routes + middleware configured");
    step_timer.finish();

    overall_timer.finish();
    log_success!("Crontab API server created successfully");
    Ok(app)
}

/// Build the router over an assembled state.
///
/// Used by [`create_app`] and by tests that inject their own stores.
/// No request timeout is layered here: a slow call is bounded by the
/// stores' own timeouts and still ends in an envelope.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .merge(api::create_router())
        .merge(gateway::create_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin, echoed back so credentials can be allowed.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods(methods)
        .allow_headers(headers)
}

async fn connect_coordinator(config: &AppConfig) -> anyhow::Result<Arc<dyn JobCoordinator>> {
    let coordination = &config.coordination;
    let timer = OpTimer::new("server", "coordination");

    let coordinator: Arc<dyn JobCoordinator> = match coordination.backend {
        CoordinationBackend::Memory => {
            log_init_warning!("In-memory coordination store: jobs are lost on restart and no worker can see them");
            log_init_step!(1, 3, "Coordination store", "memory");
            Arc::new(InMemoryCoordinator::new())
        }
        CoordinationBackend::Redis => {
            let url = coordination
                .url
                .as_deref()
                .context("coordination.url is required for the redis backend")?;
            let result = RedisCoordinator::connect(
                url,
                Duration::from_millis(coordination.connect_timeout_ms),
                coordination.kill_signal_ttl_secs,
            )
            .await;
            timer.finish_with_result(result.as_ref());
            let coordinator = result.context("failed to connect to the coordination store")?;
            log_init_step!(1, 3, "Coordination store", format!("redis ({url})"));
            return Ok(Arc::new(coordinator));
        }
    };

    timer.finish();
    Ok(coordinator)
}

async fn open_log_store(config: &AppConfig) -> anyhow::Result<Arc<dyn LogStore>> {
    let log_store = &config.log_store;
    let timer = OpTimer::new("server", "log_store");

    let store: Arc<dyn LogStore> = match log_store.backend {
        LogStoreBackend::Memory => {
            log_init_warning!("In-memory log store: execution history is lost on restart");
            log_init_step!(2, 3, "Log store", "memory");
            Arc::new(InMemoryLogStore::new())
        }
        LogStoreBackend::Sqlite => {
            let path = std::path::Path::new(&log_store.path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log store directory {}", parent.display())
                })?;
            }
            let result = SqliteLogStore::open(
                path,
                Duration::from_millis(log_store.connect_timeout_ms),
            )
            .await;
            timer.finish_with_result(result.as_ref());
            let store = result.context("failed to open the log store")?;
            log_init_step!(2, 3, "Log store", format!("sqlite ({})", store.path().display()));
            return Ok(Arc::new(store));
        }
    };

    timer.finish();
    Ok(store)
}
