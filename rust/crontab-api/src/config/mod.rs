//! Configuration management for the crontab API.
//!
//! Configuration is layered from defaults, an optional config file and
//! environment variables, then checked by [`ConfigValidator`]:
//!
//! ```rust,ignore
//! use crontab_api::config::{AppConfig, ConfigValidator};
//!
//! let config = AppConfig::load()?;
//! ConfigValidator::validate(&config)?;
//! ```
//!
//! # Environment
//!
//! Nested keys use the `CRONTAB` prefix and `__` as separator, e.g.
//! `CRONTAB__SERVER__PORT=8070` or `CRONTAB__COORDINATION__BACKEND=redis`.
//! `REDIS_URL` and `CRONTAB_LOG_DB` are accepted as shortcuts.

pub mod error;
pub mod validator;

pub use error::{ConfigResult, ConfigurationError};
pub use validator::ConfigValidator;

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Coordination store configuration.
    #[serde(default)]
    pub coordination: CoordinationConfig,
    /// Execution log store configuration.
    #[serde(default)]
    pub log_store: LogStoreConfig,
    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment and config files.
    ///
    /// Sources, lowest precedence first:
    /// 1. Default values
    /// 2. Config file (`config/crontab-api.{toml,yaml,json}`, or `path`)
    /// 3. Environment variables
    ///
    /// The result is validated; use [`Self::load_unchecked`] to skip that.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default config file.
    pub fn load_from(path: Option<&str>) -> anyhow::Result<Self> {
        let config = Self::load_unchecked(path)?;

        ConfigValidator::validate(&config)
            .map_err(|e| anyhow::anyhow!("Configuration validation failed:\n\n{e}"))?;

        Ok(config)
    }

    /// Load configuration without validation.
    pub fn load_unchecked(path: Option<&str>) -> anyhow::Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let file = path.unwrap_or("config/crontab-api");
        let config = config::Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .add_source(config::File::with_name(file).required(path.is_some()))
            .add_source(
                config::Environment::with_prefix("CRONTAB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        if let Ok(url) = std::env::var("REDIS_URL") {
            app_config.coordination.url = Some(url);
        }
        if let Ok(path) = std::env::var("CRONTAB_LOG_DB") {
            app_config.log_store.path = path;
        }

        Ok(app_config)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// API port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Coordination store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinationBackend {
    /// In-process registry; state is lost on restart.
    #[default]
    Memory,
    /// Shared Redis instance, also read by the workers.
    Redis,
}

impl std::fmt::Display for CoordinationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

/// Coordination store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: CoordinationBackend,
    /// Redis connection URL (required for the redis backend).
    pub url: Option<String>,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Lifetime of a kill signal in seconds.
    #[serde(default = "default_kill_signal_ttl")]
    pub kill_signal_ttl_secs: u64,
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_kill_signal_ttl() -> u64 {
    1
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            backend: CoordinationBackend::default(),
            url: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            kill_signal_ttl_secs: default_kill_signal_ttl(),
        }
    }
}

/// Execution log store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStoreBackend {
    /// In-process store; state is lost on restart.
    Memory,
    /// SQLite database file.
    #[default]
    Sqlite,
}

impl std::fmt::Display for LogStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Execution log store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogStoreConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: LogStoreBackend,
    /// Database path for the sqlite backend.
    #[serde(default = "default_log_db_path")]
    pub path: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_log_db_path() -> String {
    "./data/cron-logs.db".to_string()
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            backend: LogStoreBackend::default(),
            path: default_log_db_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Cross-origin policy.
///
/// Any origin is accepted and credentials are allowed; the allowed origin
/// is echoed back from the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed request methods.
    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,
    /// Allowed request headers.
    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,
}

fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cors_headers() -> Vec<String> {
    ["Origin", "Content-Length", "Content-Type", "Cookie"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to use JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8070);
        assert_eq!(config.coordination.backend, CoordinationBackend::Memory);
        assert_eq!(config.log_store.backend, LogStoreBackend::Sqlite);
        assert_eq!(config.coordination.kill_signal_ttl_secs, 1);
        assert_eq!(config.cors.allowed_methods.len(), 7);
        assert!(config.cors.allowed_headers.contains(&"Cookie".to_string()));
    }

    #[test]
    fn test_backends_deserialize_lowercase() {
        let config: CoordinationConfig =
            serde_json::from_str(r#"{"backend": "redis", "url": "redis://127.0.0.1/"}"#).unwrap();
        assert_eq!(config.backend, CoordinationBackend::Redis);
        assert_eq!(config.connect_timeout_ms, 5000);

        let config: LogStoreConfig = serde_json::from_str(r#"{"backend": "memory"}"#).unwrap();
        assert_eq!(config.backend, LogStoreBackend::Memory);
        assert_eq!(config.path, "./data/cron-logs.db");
    }

    #[test]
    #[serial]
    fn test_load_from_file_and_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[log_store]\nbackend = \"memory\"\n"
        )
        .unwrap();

        std::env::set_var("CRONTAB__COORDINATION__CONNECT_TIMEOUT_MS", "1500");
        let config = AppConfig::load_from(file.path().to_str()).unwrap();
        std::env::remove_var("CRONTAB__COORDINATION__CONNECT_TIMEOUT_MS");

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.coordination.connect_timeout_ms, 1500);
        assert_eq!(config.log_store.backend, LogStoreBackend::Memory);
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[coordination]\nbackend = \"redis\"\n").unwrap();

        let err = AppConfig::load_from(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }
}
