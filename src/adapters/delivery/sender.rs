//! HTTP sender for signed webhook deliveries.

use std::time::Duration;

use crate::adapters::delivery::sign_payload;
use crate::domain::foundation::{DeliveryId, Timestamp};

/// Signature header receivers verify.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
/// Timestamp header, mirroring the `t=` component of the signature.
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
/// Delivery id header so receivers can deduplicate redeliveries.
pub const DELIVERY_ID_HEADER: &str = "X-Webhook-ID";

/// Result of one delivery attempt.
///
/// A timeout is a retryable failure like any non-2xx response; only the
/// delivery record's attempt budget makes a failure terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// HTTP status in [200, 300).
    Delivered { status: u16 },
    /// Non-2xx response, timeout, or transport error.
    Failed {
        status: Option<u16>,
        error: String,
    },
}

/// Sends signed payloads to tenant endpoints with a bounded per-attempt
/// timeout.
pub struct WebhookSender {
    http_client: reqwest::Client,
}

impl WebhookSender {
    /// Build a sender with the given per-attempt timeout.
    pub fn new(attempt_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(attempt_timeout)
            .build()
            .unwrap_or_default();

        Self { http_client }
    }

    /// Execute one delivery attempt.
    ///
    /// Never returns an error: every failure mode is data in the outcome
    /// so the caller can persist it and decide on retry.
    pub async fn send(
        &self,
        url: &str,
        delivery_id: &DeliveryId,
        body: &str,
        secret: &str,
    ) -> AttemptOutcome {
        let timestamp = Timestamp::now().as_unix_secs();
        let signature = sign_payload(secret, timestamp, body);

        let response = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(DELIVERY_ID_HEADER, delivery_id.to_string())
            .body(body.to_string())
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                if (200..300).contains(&status) {
                    AttemptOutcome::Delivered { status }
                } else {
                    AttemptOutcome::Failed {
                        status: Some(status),
                        error: format!("endpoint returned HTTP {}", status),
                    }
                }
            }
            Err(e) if e.is_timeout() => AttemptOutcome::Failed {
                status: None,
                error: "attempt timed out".to_string(),
            },
            Err(e) => AttemptOutcome::Failed {
                status: None,
                error: format!("request failed: {}", e),
            },
        }
    }
}
