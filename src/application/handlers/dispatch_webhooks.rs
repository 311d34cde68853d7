//! Webhook dispatch: fan a domain event into per-endpoint deliveries.
//!
//! Subscribed to the tenant-visible event types. For every enabled
//! endpoint of the event's tenant, a pending delivery row is created
//! (stable payload, unique idempotency key) and a delivery job is
//! enqueued. Deliveries for the same event are independent across
//! endpoints; no ordering between them is promised.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope, TenantId};
use crate::domain::webhook::WebhookDelivery;
use crate::ports::{
    EventHandler, EventSubscriber, Job, JobQueue, WebhookDeliveryRepository,
    WebhookEndpointRepository,
};

/// Event types delivered to tenant endpoints. This is the outbound
/// contract: consumers switch on these names.
pub const WEBHOOK_EVENT_TYPES: &[&str] = &["ticket.created", "message.created", "ticket.updated"];

/// Bus handler creating deliveries and scheduling attempts.
pub struct WebhookDispatchHandler {
    endpoints: Arc<dyn WebhookEndpointRepository>,
    deliveries: Arc<dyn WebhookDeliveryRepository>,
    job_queue: Arc<dyn JobQueue>,
}

impl WebhookDispatchHandler {
    pub fn new(
        endpoints: Arc<dyn WebhookEndpointRepository>,
        deliveries: Arc<dyn WebhookDeliveryRepository>,
        job_queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            endpoints,
            deliveries,
            job_queue,
        }
    }

    /// Register this handler on an event bus.
    pub fn register(self: Arc<Self>, subscriber: &impl EventSubscriber) {
        subscriber.subscribe_all(WEBHOOK_EVENT_TYPES, self);
    }

    /// The stable `{event, timestamp, data}` body consumers verify and
    /// parse. Field names are part of the contract.
    fn build_payload(envelope: &EventEnvelope) -> JsonValue {
        let mut data = Map::new();
        copy_field(&envelope.payload, "ticket_id", "ticketId", &mut data);
        copy_field(&envelope.payload, "tenant_id", "accountId", &mut data);
        copy_field(&envelope.payload, "message_id", "messageId", &mut data);
        copy_field(&envelope.payload, "source", "source", &mut data);
        copy_field(&envelope.payload, "text", "text", &mut data);
        copy_field(&envelope.payload, "visitor_id", "visitorId", &mut data);
        copy_field(&envelope.payload, "status", "status", &mut data);
        copy_field(&envelope.payload, "subject", "subject", &mut data);

        serde_json::json!({
            "event": envelope.event_type,
            "timestamp": envelope.occurred_at.to_rfc3339(),
            "data": JsonValue::Object(data),
        })
    }
}

fn copy_field(payload: &JsonValue, from: &str, to: &str, data: &mut Map<String, JsonValue>) {
    if let Some(value) = payload.get(from) {
        if !value.is_null() {
            data.insert(to.to_string(), value.clone());
        }
    }
}

#[async_trait]
impl EventHandler for WebhookDispatchHandler {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let Some(tenant_id) = event
            .payload
            .get("tenant_id")
            .and_then(|v| v.as_str())
            .map(TenantId::from_string)
        else {
            tracing::debug!(
                event_type = %event.event_type,
                event_id = %event.event_id,
                "Event has no tenant, skipping webhook dispatch"
            );
            return Ok(());
        };

        let endpoints = self.endpoints.list_enabled_for_tenant(&tenant_id).await?;
        if endpoints.is_empty() {
            return Ok(());
        }

        let payload = Self::build_payload(&event);

        for endpoint in endpoints {
            let delivery = WebhookDelivery::pending(
                endpoint.id,
                event.event_type.clone(),
                &event.aggregate_id,
                payload.clone(),
            );
            self.deliveries.insert(&delivery).await?;

            self.job_queue
                .enqueue(Job::DeliverWebhook {
                    delivery_id: delivery.id,
                })
                .await?;

            tracing::debug!(
                delivery_id = %delivery.id,
                endpoint_id = %endpoint.id,
                event_type = %event.event_type,
                "Webhook delivery scheduled"
            );
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "WebhookDispatchHandler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryWebhookDeliveryRepository, InMemoryWebhookEndpointRepository,
    };
    use crate::domain::webhook::{DeliveryStatus, WebhookEndpoint};
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct RecordingQueue {
        jobs: Mutex<Vec<Job>>,
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn enqueue(&self, job: Job) -> Result<(), DomainError> {
            self.jobs.lock().await.push(job);
            Ok(())
        }

        async fn enqueue_after(&self, job: Job, _delay: Duration) -> Result<(), DomainError> {
            self.jobs.lock().await.push(job);
            Ok(())
        }
    }

    struct Fixture {
        handler: WebhookDispatchHandler,
        endpoints: Arc<InMemoryWebhookEndpointRepository>,
        deliveries: Arc<InMemoryWebhookDeliveryRepository>,
        queue: Arc<RecordingQueue>,
    }

    fn fixture() -> Fixture {
        let endpoints = Arc::new(InMemoryWebhookEndpointRepository::new());
        let deliveries = Arc::new(InMemoryWebhookDeliveryRepository::new());
        let queue = Arc::new(RecordingQueue {
            jobs: Mutex::new(Vec::new()),
        });
        Fixture {
            handler: WebhookDispatchHandler::new(
                endpoints.clone(),
                deliveries.clone(),
                queue.clone(),
            ),
            endpoints,
            deliveries,
            queue,
        }
    }

    fn message_envelope(tenant: &str) -> EventEnvelope {
        EventEnvelope::new(
            "message.created",
            "msg-1",
            "Message",
            serde_json::json!({
                "ticket_id": "t-1",
                "tenant_id": tenant,
                "message_id": "msg-1",
                "source": "visitor",
                "text": "hello",
            }),
        )
    }

    #[tokio::test]
    async fn creates_one_delivery_per_enabled_endpoint() {
        let f = fixture();
        let tenant = TenantId::from_string("acct-1");
        for _ in 0..2 {
            f.endpoints
                .save(&WebhookEndpoint::register(tenant.clone(), "https://e.example/h").unwrap())
                .await
                .unwrap();
        }
        let mut disabled =
            WebhookEndpoint::register(tenant.clone(), "https://e.example/off").unwrap();
        disabled.disable();
        f.endpoints.save(&disabled).await.unwrap();

        f.handler.handle(message_envelope("acct-1")).await.unwrap();

        let all = f.deliveries.all().await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|d| d.status == DeliveryStatus::Pending));
        assert_eq!(f.queue.jobs.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn payload_follows_the_wire_contract() {
        let f = fixture();
        let tenant = TenantId::from_string("acct-1");
        f.endpoints
            .save(&WebhookEndpoint::register(tenant, "https://e.example/h").unwrap())
            .await
            .unwrap();

        f.handler.handle(message_envelope("acct-1")).await.unwrap();

        let delivery = f.deliveries.all().await.remove(0);
        assert_eq!(delivery.payload["event"], "message.created");
        assert!(delivery.payload["timestamp"].is_string());
        assert_eq!(delivery.payload["data"]["ticketId"], "t-1");
        assert_eq!(delivery.payload["data"]["accountId"], "acct-1");
        assert_eq!(delivery.payload["data"]["source"], "visitor");
        // Absent fields stay absent rather than null.
        assert!(delivery.payload["data"].get("status").is_none());
    }

    #[tokio::test]
    async fn tenant_without_endpoints_is_a_noop() {
        let f = fixture();
        f.handler.handle(message_envelope("acct-1")).await.unwrap();
        assert!(f.deliveries.all().await.is_empty());
        assert!(f.queue.jobs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn event_without_tenant_is_skipped() {
        let f = fixture();
        let envelope = EventEnvelope::new("ticket.updated", "t-1", "Ticket", serde_json::json!({}));
        assert!(f.handler.handle(envelope).await.is_ok());
        assert!(f.deliveries.all().await.is_empty());
    }
}
