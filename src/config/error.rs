//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Platform secret must not be empty: {0}")]
    EmptyPlatformSecret(&'static str),

    #[error("Platform API base URL must be http(s): {0}")]
    InvalidPlatformUrl(&'static str),

    #[error("Webhook delivery max_attempts must be between 1 and 20")]
    InvalidMaxAttempts,

    #[error("Webhook delivery base delay must not exceed max delay")]
    InvalidBackoffRange,

    #[error("Job worker count must be between 1 and 64")]
    InvalidWorkerCount,
}
