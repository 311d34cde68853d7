//! Job runtime configuration.
//!
//! The pipeline runs in one of two execution modes with identical semantics:
//! `queued` (a worker pool draining an in-process queue, the long-lived
//! server default) or `inline` (jobs executed synchronously inside the
//! inbound request, for deployments that cannot host background workers).

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Execution mode for the job runtime.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Worker pool draining a durable in-process queue.
    #[default]
    Queued,
    /// Execute jobs synchronously within the enqueueing call.
    Inline,
}

/// Job runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Execution mode.
    #[serde(default)]
    pub mode: JobMode,

    /// Number of workers draining the queue (queued mode only).
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Queue capacity before enqueue applies backpressure.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Bounded retry count for ingest jobs failing on storage errors.
    #[serde(default = "default_ingest_retry_attempts")]
    pub ingest_retry_attempts: u32,

    /// Delay between ingest retries in milliseconds.
    #[serde(default = "default_ingest_retry_delay_ms")]
    pub ingest_retry_delay_ms: u64,
}

impl JobsConfig {
    /// Delay between ingest retries as a Duration.
    pub fn ingest_retry_delay(&self) -> Duration {
        Duration::from_millis(self.ingest_retry_delay_ms)
    }

    /// Validate job runtime values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_count == 0 || self.worker_count > 64 {
            return Err(ValidationError::InvalidWorkerCount);
        }
        Ok(())
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            mode: JobMode::default(),
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            ingest_retry_attempts: default_ingest_retry_attempts(),
            ingest_retry_delay_ms: default_ingest_retry_delay_ms(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1_024
}

fn default_ingest_retry_attempts() -> u32 {
    3
}

fn default_ingest_retry_delay_ms() -> u64 {
    2_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_queued() {
        let config = JobsConfig::default();
        assert_eq!(config.mode, JobMode::Queued);
        assert_eq!(config.worker_count, 4);
    }

    #[test]
    fn validation_rejects_zero_workers() {
        let config = JobsConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ingest_retry_delay_converts() {
        let config = JobsConfig {
            ingest_retry_delay_ms: 500,
            ..Default::default()
        };
        assert_eq!(config.ingest_retry_delay(), Duration::from_millis(500));
    }
}
