//! Outbound webhook delivery configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Delivery policy for tenant-registered webhook endpoints.
///
/// Defaults follow the documented contract: up to 5 attempts, exponential
/// backoff starting at 1 second, 30 second per-attempt timeout.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhooksConfig {
    /// Maximum delivery attempts before a delivery is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds (doubled per attempt).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-attempt HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Receiver-side timestamp tolerance in seconds.
    #[serde(default = "default_tolerance_secs")]
    pub signature_tolerance_secs: i64,
}

impl WebhooksConfig {
    /// Per-attempt HTTP timeout as a Duration.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate delivery policy values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 || self.max_attempts > 20 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidBackoffRange);
        }
        Ok(())
    }
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout_secs(),
            signature_tolerance_secs: default_tolerance_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tolerance_secs() -> i64 {
    300
}
