//! One webhook delivery attempt.
//!
//! Loads the delivery record, signs and POSTs the payload, persists the
//! outcome, and re-enqueues itself with exponential backoff until the
//! attempt budget is exhausted. A timeout is a retryable failure like
//! any non-2xx response; terminal states are only `success` and, after
//! the final attempt, `failed`.

use std::sync::{Arc, OnceLock};

use crate::adapters::delivery::{AttemptOutcome, WebhookSender};
use crate::domain::foundation::{DeliveryId, DomainError};
use crate::domain::webhook::{DeliveryDisposition, DeliveryPolicy};
use crate::ports::{Job, JobQueue, WebhookDeliveryRepository, WebhookEndpointRepository};

/// Handler executing delivery attempts.
///
/// The job queue is injected after construction (the queue's executor is
/// built from this handler, so the dependency is cyclic by nature).
pub struct AttemptDeliveryHandler {
    deliveries: Arc<dyn WebhookDeliveryRepository>,
    endpoints: Arc<dyn WebhookEndpointRepository>,
    sender: WebhookSender,
    policy: DeliveryPolicy,
    job_queue: OnceLock<Arc<dyn JobQueue>>,
}

impl AttemptDeliveryHandler {
    pub fn new(
        deliveries: Arc<dyn WebhookDeliveryRepository>,
        endpoints: Arc<dyn WebhookEndpointRepository>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            deliveries,
            endpoints,
            sender: WebhookSender::new(policy.attempt_timeout),
            policy,
            job_queue: OnceLock::new(),
        }
    }

    /// Wire the queue used for backoff re-enqueues. Called once during
    /// startup, after the job runtime exists.
    pub fn set_job_queue(&self, queue: Arc<dyn JobQueue>) {
        let _ = self.job_queue.set(queue);
    }

    pub async fn handle(&self, delivery_id: DeliveryId) -> Result<(), DomainError> {
        let Some(mut delivery) = self.deliveries.find_by_id(&delivery_id).await? else {
            tracing::warn!(delivery_id = %delivery_id, "Delivery record missing, dropping job");
            return Ok(());
        };

        if delivery.is_terminal() {
            tracing::debug!(delivery_id = %delivery_id, "Delivery already terminal");
            return Ok(());
        }

        // The endpoint (and its current secret) is re-read per attempt
        // so secret rotation and disabling take effect mid-retry.
        let endpoint = self.endpoints.find_by_id(&delivery.endpoint_id).await?;
        let Some(endpoint) = endpoint.filter(|e| e.enabled) else {
            delivery.fail_terminally("endpoint removed or disabled");
            self.deliveries.update(&delivery).await?;
            return Ok(());
        };

        let body = delivery.payload.to_string();
        let outcome = self
            .sender
            .send(&endpoint.url, &delivery.id, &body, &endpoint.secret)
            .await;

        match outcome {
            AttemptOutcome::Delivered { status } => {
                delivery.record_success(status);
                self.deliveries.update(&delivery).await?;
                tracing::info!(
                    delivery_id = %delivery.id,
                    attempts = delivery.attempt_count,
                    "Webhook delivered"
                );
            }
            AttemptOutcome::Failed { status, error } => {
                let disposition =
                    delivery.record_failure(status, &error, self.policy.max_attempts);
                self.deliveries.update(&delivery).await?;

                match disposition {
                    DeliveryDisposition::Retry => {
                        let delay = self.policy.backoff_with_jitter(delivery.attempt_count);
                        tracing::warn!(
                            delivery_id = %delivery.id,
                            attempts = delivery.attempt_count,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Delivery attempt failed, retrying"
                        );
                        if let Some(queue) = self.job_queue.get() {
                            queue
                                .enqueue_after(
                                    Job::DeliverWebhook {
                                        delivery_id: delivery.id,
                                    },
                                    delay,
                                )
                                .await?;
                        } else {
                            tracing::error!(
                                delivery_id = %delivery.id,
                                "No job queue wired, retry dropped"
                            );
                        }
                    }
                    DeliveryDisposition::Exhausted => {
                        tracing::warn!(
                            delivery_id = %delivery.id,
                            attempts = delivery.attempt_count,
                            "Delivery failed terminally"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
