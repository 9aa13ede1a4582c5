use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_EVENT_BUFFER: usize = 256;

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

/// Application configuration.
///
/// Loaded from layered files under `config/` with `STOCKFLOW__`-prefixed
/// environment overrides on top.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (Postgres in production, SQLite in tests)
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment: "development", "test" or "production"
    pub environment: String,

    /// Logging level filter
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Outbound event channel capacity
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Optional statement timeout passed down to the pool
    #[serde(default)]
    pub db_statement_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Builds a configuration directly, bypassing file layering. Used by
    /// tests and embedded setups.
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            event_buffer_size: default_event_buffer(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_statement_timeout_secs: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == DEFAULT_ENV
    }
}

/// Loads configuration from `config/default`, an environment-specific
/// overlay, and `STOCKFLOW__`-prefixed environment variables, in that
/// order of precedence (later wins).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("STOCKFLOW_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .set_default("environment", run_env.clone())?
        .add_source(File::from(Path::new(CONFIG_DIR).join("default")).required(false))
        .add_source(File::from(Path::new(CONFIG_DIR).join(&run_env)).required(false))
        .add_source(Environment::with_prefix("STOCKFLOW").separator("__"));

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database_url", url)?;
    }

    let cfg: AppConfig = builder.build()?.try_deserialize()?;

    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    info!(environment = %cfg.environment, "configuration loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_fills_defaults() {
        let cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.event_buffer_size, DEFAULT_EVENT_BUFFER);
        assert!(!cfg.auto_migrate);
        assert!(!cfg.is_production());
    }

    #[test]
    fn validation_rejects_empty_database_url() {
        let cfg = AppConfig::new(String::new(), "test".into());
        assert!(cfg.validate().is_err());
    }
}
