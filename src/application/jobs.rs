//! The single job executor both runtime modes drive.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::pipeline::IngestOutcome;
use crate::ports::{Job, JobExecutor};

use super::handlers::{AttemptDeliveryHandler, IngestPlatformEventHandler};

/// Maps each job variant to its handler. This is the only definition of
/// what a job means; queue adapters decide when it runs.
pub struct PipelineJobExecutor {
    ingest: Arc<IngestPlatformEventHandler>,
    delivery: Arc<AttemptDeliveryHandler>,
}

impl PipelineJobExecutor {
    pub fn new(
        ingest: Arc<IngestPlatformEventHandler>,
        delivery: Arc<AttemptDeliveryHandler>,
    ) -> Self {
        Self { ingest, delivery }
    }
}

#[async_trait]
impl JobExecutor for PipelineJobExecutor {
    async fn execute(&self, job: Job) -> Result<(), DomainError> {
        match job {
            Job::IngestPlatformEvent(event) => {
                let outcome = self.ingest.handle(event).await?;
                if let IngestOutcome::Skipped(reason) = outcome {
                    tracing::debug!(reason = reason.as_str(), "Ingest skipped");
                }
                Ok(())
            }
            Job::DeliverWebhook { delivery_id } => self.delivery.handle(delivery_id).await,
        }
    }
}
