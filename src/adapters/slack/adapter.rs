//! Slack implementation of the PlatformAdapter port.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value as JsonValue;

use crate::config::SlackConfig;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::installation::{Installation, Platform};
use crate::domain::pipeline::{CanonicalEvent, InboundRejection};
use crate::ports::{
    AuthenticatedEvent, ExternalMessageRef, ExternalThreadRef, InboundRequest, PlatformAdapter,
};

use super::signature::verify_slack_signature;
use super::types::{SlackEnvelope, SlackPostMessageRequest, SlackPostMessageResponse};

/// Slack platform adapter.
///
/// Holds the app-level signing secret for inbound verification; outbound
/// calls authenticate with the per-installation bot token.
pub struct SlackAdapter {
    config: SlackConfig,
    http_client: reqwest::Client,
}

impl SlackAdapter {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post(
        &self,
        installation: &Installation,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String, DomainError> {
        let url = format!("{}/chat.postMessage", self.config.api_base_url);
        let request = SlackPostMessageRequest {
            channel,
            text,
            thread_ts,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&installation.bot_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::platform_api(format!("slack request failed: {}", e)))?;

        let body: SlackPostMessageResponse = response
            .json()
            .await
            .map_err(|e| DomainError::platform_api(format!("slack response unreadable: {}", e)))?;

        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
            tracing::warn!(channel = %channel, error = %reason, "chat.postMessage failed");
            return Err(DomainError::platform_api(format!(
                "chat.postMessage: {}",
                reason
            )));
        }

        body.ts
            .ok_or_else(|| DomainError::platform_api("chat.postMessage returned ok without ts"))
    }
}

#[async_trait]
impl PlatformAdapter for SlackAdapter {
    fn platform(&self) -> Platform {
        Platform::Slack
    }

    fn verify(&self, request: &InboundRequest) -> Result<AuthenticatedEvent, InboundRejection> {
        let signature = request
            .header("x-slack-signature")
            .ok_or(InboundRejection::InvalidSignature)?;
        let timestamp = request
            .header("x-slack-request-timestamp")
            .ok_or_else(|| InboundRejection::malformed("missing request timestamp"))?;

        verify_slack_signature(
            self.config.signing_secret.expose_secret(),
            signature,
            timestamp,
            &request.body,
            Timestamp::now().as_unix_secs(),
        )?;

        let payload: JsonValue = serde_json::from_slice(&request.body)
            .map_err(|e| InboundRejection::malformed(format!("invalid JSON: {}", e)))?;

        Ok(AuthenticatedEvent {
            platform: Platform::Slack,
            payload,
        })
    }

    fn normalize(&self, event: &AuthenticatedEvent) -> Option<CanonicalEvent> {
        let envelope: SlackEnvelope = serde_json::from_value(event.payload.clone()).ok()?;
        if envelope.envelope_type != "event_callback" {
            return None;
        }

        let inner = envelope.event?;
        if inner.event_type != "message" {
            return None;
        }
        // Edits, deletions and join notices are not ticket traffic.
        if let Some(subtype) = inner.subtype.as_deref() {
            if subtype != "bot_message" {
                return None;
            }
        }

        let ts = inner.ts?;
        let author_is_bot = inner.bot_id.is_some() || inner.subtype.as_deref() == Some("bot_message");
        let author = inner
            .user
            .or(inner.bot_id)
            .unwrap_or_else(|| "unknown".to_string());
        let occurred_at = ts
            .split('.')
            .next()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Timestamp::from_unix_secs)
            .unwrap_or_else(Timestamp::now);

        Some(CanonicalEvent {
            platform: Platform::Slack,
            external_event_id: envelope.event_id?,
            external_chat_id: envelope.team_id?,
            external_thread_ref: inner.thread_ts,
            author_external_id: author,
            author_is_bot,
            text: inner.text.unwrap_or_default(),
            occurred_at,
            raw: event.payload.clone(),
        })
    }

    async fn post_message(
        &self,
        installation: &Installation,
        destination: &str,
        text: &str,
        thread_ref: Option<&str>,
    ) -> Result<ExternalMessageRef, DomainError> {
        let ts = self.post(installation, destination, text, thread_ref).await?;
        Ok(ExternalMessageRef { message_ref: ts })
    }

    async fn create_thread(
        &self,
        installation: &Installation,
        destination: &str,
        title: &str,
        body: &str,
    ) -> Result<ExternalThreadRef, DomainError> {
        // A Slack thread is a root message; its ts is the thread handle.
        let text = format!("*{}*\n{}", title, body);
        let ts = self.post(installation, destination, &text, None).await?;

        Ok(ExternalThreadRef {
            external_chat_id: installation.external_workspace_id.clone(),
            thread_ref: ts,
        })
    }
}
