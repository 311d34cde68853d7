//! Webhook delivery records and their state machine.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::foundation::{DeliveryId, EndpointId, Timestamp};

/// Delivery lifecycle: `pending -> {success, pending(retry), failed}`.
///
/// `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Failed,
}

impl DeliveryStatus {
    /// Stable lowercase name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Success => "success",
            DeliveryStatus::Failed => "failed",
        }
    }
}

/// What the delivery engine should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDisposition {
    /// Re-enqueue with backoff.
    Retry,
    /// Attempt budget exhausted; the record is now terminal `failed`.
    Exhausted,
}

/// One delivery record per (endpoint, triggering domain event).
///
/// Created in `pending` before the first attempt; every attempt updates
/// the attempt count and last status/error so tenants can see a full
/// delivery history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: DeliveryId,
    pub endpoint_id: EndpointId,

    /// Event type being delivered ("ticket.created", ...).
    pub event_type: String,

    /// Key guaranteeing one logical delivery per (endpoint, event).
    pub idempotency_key: String,

    /// The signed JSON body `{event, timestamp, data}`.
    pub payload: JsonValue,

    pub status: DeliveryStatus,
    pub attempt_count: u32,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WebhookDelivery {
    /// Creates a pending delivery for an endpoint and event.
    pub fn pending(
        endpoint_id: EndpointId,
        event_type: impl Into<String>,
        entity_id: &str,
        payload: JsonValue,
    ) -> Self {
        let event_type = event_type.into();
        let now = Timestamp::now();
        let idempotency_key = format!(
            "{}:{}:{}:{}",
            endpoint_id,
            event_type,
            entity_id,
            Uuid::new_v4().simple()
        );

        Self {
            id: DeliveryId::new(),
            endpoint_id,
            event_type,
            idempotency_key,
            payload,
            status: DeliveryStatus::Pending,
            attempt_count: 0,
            last_status: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether no further attempts may happen.
    pub fn is_terminal(&self) -> bool {
        self.status != DeliveryStatus::Pending
    }

    /// Records a successful attempt (2xx response).
    pub fn record_success(&mut self, http_status: u16) {
        self.attempt_count += 1;
        self.status = DeliveryStatus::Success;
        self.last_status = Some(http_status);
        self.last_error = None;
        self.updated_at = Timestamp::now();
    }

    /// Marks the delivery terminally failed without consuming an attempt
    /// (endpoint deleted or disabled between dispatch and attempt).
    pub fn fail_terminally(&mut self, error: impl Into<String>) {
        self.status = DeliveryStatus::Failed;
        self.last_error = Some(error.into());
        self.updated_at = Timestamp::now();
    }

    /// Records a failed attempt (non-2xx, timeout, or transport error).
    ///
    /// Counts the attempt, stores the last status/error, and flips the
    /// record to terminal `failed` once `max_attempts` is reached.
    pub fn record_failure(
        &mut self,
        http_status: Option<u16>,
        error: impl Into<String>,
        max_attempts: u32,
    ) -> DeliveryDisposition {
        self.attempt_count += 1;
        self.last_status = http_status;
        self.last_error = Some(error.into());
        self.updated_at = Timestamp::now();

        if self.attempt_count >= max_attempts {
            self.status = DeliveryStatus::Failed;
            DeliveryDisposition::Exhausted
        } else {
            DeliveryDisposition::Retry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delivery() -> WebhookDelivery {
        WebhookDelivery::pending(
            EndpointId::new(),
            "message.created",
            "msg-1",
            json!({"event": "message.created"}),
        )
    }

    #[test]
    fn pending_starts_with_zero_attempts() {
        let d = delivery();
        assert_eq!(d.status, DeliveryStatus::Pending);
        assert_eq!(d.attempt_count, 0);
        assert!(!d.is_terminal());
    }

    #[test]
    fn idempotency_key_scopes_endpoint_event_entity() {
        let d = delivery();
        assert!(d.idempotency_key.starts_with(&format!("{}:", d.endpoint_id)));
        assert!(d.idempotency_key.contains(":message.created:msg-1:"));

        // Nonce makes two deliveries of the same event distinct.
        let other = WebhookDelivery::pending(
            d.endpoint_id,
            "message.created",
            "msg-1",
            json!({}),
        );
        assert_ne!(d.idempotency_key, other.idempotency_key);
    }

    #[test]
    fn success_is_terminal_and_counts_the_attempt() {
        let mut d = delivery();
        d.record_success(200);
        assert_eq!(d.status, DeliveryStatus::Success);
        assert_eq!(d.attempt_count, 1);
        assert_eq!(d.last_status, Some(200));
        assert!(d.is_terminal());
    }

    #[test]
    fn failures_retry_until_budget_exhausted() {
        let mut d = delivery();

        for attempt in 1..5 {
            let disposition = d.record_failure(Some(500), "server error", 5);
            assert_eq!(disposition, DeliveryDisposition::Retry);
            assert_eq!(d.attempt_count, attempt);
            assert_eq!(d.status, DeliveryStatus::Pending);
        }

        let disposition = d.record_failure(Some(500), "server error", 5);
        assert_eq!(disposition, DeliveryDisposition::Exhausted);
        assert_eq!(d.attempt_count, 5);
        assert_eq!(d.status, DeliveryStatus::Failed);
    }

    #[test]
    fn four_failures_then_success_lands_at_five_attempts() {
        let mut d = delivery();
        for _ in 0..4 {
            assert_eq!(d.record_failure(Some(500), "boom", 5), DeliveryDisposition::Retry);
        }
        d.record_success(200);

        assert_eq!(d.status, DeliveryStatus::Success);
        assert_eq!(d.attempt_count, 5);
        assert!(d.last_error.is_none());
    }

    #[test]
    fn timeout_failure_records_without_status() {
        let mut d = delivery();
        d.record_failure(None, "request timed out", 5);
        assert_eq!(d.last_status, None);
        assert_eq!(d.last_error.as_deref(), Some("request timed out"));
    }
}
