//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `THREADLINE`
//! prefix and nested sections use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use threadline::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod jobs;
mod platforms;
mod server;
mod webhooks;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use jobs::{JobMode, JobsConfig};
pub use platforms::{DiscordConfig, PlatformsConfig, SlackConfig, TelegramConfig};
pub use server::{Environment, ServerConfig};
pub use webhooks::WebhooksConfig;

use serde::Deserialize;

/// Root application configuration.
///
/// Contains all configuration sections for the Threadline server.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Chat platform credentials (Slack / Discord / Telegram)
    #[serde(default)]
    pub platforms: PlatformsConfig,

    /// Outbound webhook delivery policy
    #[serde(default)]
    pub webhooks: WebhooksConfig,

    /// Job runtime configuration (queued vs inline execution)
    #[serde(default)]
    pub jobs: JobsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file if present (development), then reads variables
    /// with the `THREADLINE` prefix using `__` to separate nested values:
    ///
    /// - `THREADLINE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `THREADLINE__PLATFORMS__SLACK__SIGNING_SECRET=...` -> `platforms.slack.signing_secret`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("THREADLINE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.platforms.validate()?;
        self.webhooks.validate()?;
        self.jobs.validate()?;
        Ok(())
    }

    /// Check if running in production environment.
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var(
            "THREADLINE__DATABASE__URL",
            "postgresql://test@localhost/threadline",
        );
    }

    fn clear_env() {
        for (key, _) in env::vars() {
            if key.starts_with("THREADLINE__") {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn load_with_minimal_env_succeeds() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();

        let config = AppConfig::load().unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/threadline");
        assert_eq!(config.server.port, 8080);

        clear_env();
    }

    #[test]
    fn nested_values_override_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        env::set_var("THREADLINE__SERVER__PORT", "9999");
        env::set_var("THREADLINE__JOBS__WORKER_COUNT", "8");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.jobs.worker_count, 8);

        clear_env();
    }

    #[test]
    fn validate_accepts_minimal_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();

        let config = AppConfig::load().unwrap();
        assert!(config.validate().is_ok());

        clear_env();
    }
}
