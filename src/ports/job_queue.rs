//! JobQueue port - the durable background-job abstraction.
//!
//! The pipeline schedules two kinds of work: ingesting a verified
//! canonical event and attempting one webhook delivery. Both are
//! expressed as [`Job`] values executed by a single [`JobExecutor`], so
//! the queued worker pool and the inline runner are interchangeable by
//! construction: the execution mode never changes what a job means.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{DeliveryId, DomainError};
use crate::domain::pipeline::CanonicalEvent;

/// The closed set of background jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Job {
    /// Run the ingest state machine over a verified canonical event.
    IngestPlatformEvent(CanonicalEvent),

    /// Execute one delivery attempt for a pending webhook delivery.
    DeliverWebhook { delivery_id: DeliveryId },
}

impl Job {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Job::IngestPlatformEvent(_) => "ingest-platform-event",
            Job::DeliverWebhook { .. } => "deliver-webhook",
        }
    }
}

/// Port for scheduling jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Schedules a job for execution as soon as possible.
    async fn enqueue(&self, job: Job) -> Result<(), DomainError>;

    /// Schedules a job to run after a delay (retry backoff).
    async fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), DomainError>;
}

/// Executes jobs. There is exactly one executor implementation wired at
/// startup; queue adapters only decide *when* it runs.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: Job) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_queue_object_safe(_: &dyn JobQueue) {}

    #[allow(dead_code)]
    fn assert_executor_object_safe(_: &dyn JobExecutor) {}

    #[test]
    fn job_kinds_are_stable() {
        let job = Job::DeliverWebhook {
            delivery_id: DeliveryId::new(),
        };
        assert_eq!(job.kind(), "deliver-webhook");
    }
}
