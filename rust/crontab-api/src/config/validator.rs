//! Startup validation of the configuration.

use axum::http::{HeaderName, Method};

use super::error::{ConfigResult, ConfigurationError};
use super::{AppConfig, CoordinationBackend, CoordinationConfig, CorsConfig, LogStoreBackend, LogStoreConfig};

/// Checks a loaded configuration before any component is built.
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire application configuration.
    ///
    /// Returns `Ok(())` if valid, or a `ConfigurationError` with all issues.
    pub fn validate(config: &AppConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if config.server.port == 0 {
            errors.push(ConfigurationError::invalid(
                "server.port is 0",
                "Set CRONTAB__SERVER__PORT to the port the API should listen on",
            ));
        }

        for result in [
            Self::validate_coordination(&config.coordination),
            Self::validate_log_store(&config.log_store),
            Self::validate_cors(&config.cors),
        ] {
            match result {
                Ok(()) => {}
                Err(ConfigurationError::Multiple(errs)) => errors.extend(errs),
                Err(e) => errors.push(e),
            }
        }

        ConfigurationError::collect(errors)
    }

    /// Validate the coordination store settings.
    pub fn validate_coordination(config: &CoordinationConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if config.backend == CoordinationBackend::Redis
            && config.url.as_deref().map_or(true, str::is_empty)
        {
            errors.push(ConfigurationError::missing_required(
                "coordination.url",
                "the redis coordination backend",
                "REDIS_URL or CRONTAB__COORDINATION__URL",
            ));
        }
        if config.connect_timeout_ms == 0 {
            errors.push(ConfigurationError::invalid(
                "coordination.connect_timeout_ms is 0",
                "Set CRONTAB__COORDINATION__CONNECT_TIMEOUT_MS, e.g. 5000",
            ));
        }
        if config.kill_signal_ttl_secs == 0 {
            errors.push(ConfigurationError::invalid(
                "coordination.kill_signal_ttl_secs is 0, kill signals would never be visible",
                "Set CRONTAB__COORDINATION__KILL_SIGNAL_TTL_SECS to at least 1",
            ));
        }

        ConfigurationError::collect(errors)
    }

    /// Validate the execution log store settings.
    pub fn validate_log_store(config: &LogStoreConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if config.backend == LogStoreBackend::Sqlite && config.path.trim().is_empty() {
            errors.push(ConfigurationError::missing_required(
                "log_store.path",
                "the sqlite log store backend",
                "CRONTAB_LOG_DB or CRONTAB__LOG_STORE__PATH",
            ));
        }
        if config.connect_timeout_ms == 0 {
            errors.push(ConfigurationError::invalid(
                "log_store.connect_timeout_ms is 0",
                "Set CRONTAB__LOG_STORE__CONNECT_TIMEOUT_MS, e.g. 5000",
            ));
        }

        ConfigurationError::collect(errors)
    }

    /// Validate the CORS allow-lists.
    ///
    /// Wildcards are rejected: credentials are always allowed, which rules
    /// out `*` for methods and headers.
    pub fn validate_cors(config: &CorsConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        for method in &config.allowed_methods {
            if method.parse::<Method>().is_err() || method == "*" {
                errors.push(ConfigurationError::invalid(
                    format!("cors.allowed_methods contains invalid method '{method}'"),
                    "List HTTP methods explicitly, e.g. GET, POST, OPTIONS",
                ));
            }
        }
        for header in &config.allowed_headers {
            if header.parse::<HeaderName>().is_err() || header == "*" {
                errors.push(ConfigurationError::invalid(
                    format!("cors.allowed_headers contains invalid header '{header}'"),
                    "List header names explicitly, e.g. Content-Type",
                ));
            }
        }

        ConfigurationError::collect(errors)
    }
}
