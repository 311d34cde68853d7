//! Discord implementation of the PlatformAdapter port.

use async_trait::async_trait;
use chrono::DateTime;
use secrecy::ExposeSecret;
use serde_json::Value as JsonValue;
use subtle::ConstantTimeEq;

use crate::config::DiscordConfig;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::installation::{Installation, Platform};
use crate::domain::pipeline::{CanonicalEvent, InboundRejection};
use crate::ports::{
    AuthenticatedEvent, ExternalMessageRef, ExternalThreadRef, InboundRequest, PlatformAdapter,
};

use super::types::{
    DiscordMessageRequest, DiscordMessageResponse, DiscordRelayEvent, DiscordThreadRequest,
    DiscordThreadResponse,
};

/// Header carrying the relay's static shared secret.
const SECRET_HEADER: &str = "x-threadline-secret";

/// Public thread channel type.
const PUBLIC_THREAD: u8 = 11;

/// Discord platform adapter.
pub struct DiscordAdapter {
    config: DiscordConfig,
    http_client: reqwest::Client,
}

impl DiscordAdapter {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn rest_post<T: serde::de::DeserializeOwned>(
        &self,
        installation: &Installation,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, DomainError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let response = self
            .http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bot {}", installation.bot_token),
            )
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::platform_api(format!("discord request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(path = %path, status = %status, "Discord REST call failed");
            return Err(DomainError::platform_api(format!(
                "discord {}: {} {}",
                path, status, detail
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::platform_api(format!("discord response unreadable: {}", e)))
    }
}

#[async_trait]
impl PlatformAdapter for DiscordAdapter {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    fn verify(&self, request: &InboundRequest) -> Result<AuthenticatedEvent, InboundRejection> {
        let provided = request
            .header(SECRET_HEADER)
            .ok_or(InboundRejection::InvalidSignature)?;
        let expected = self.config.shared_secret.expose_secret();

        if provided.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() != 1 {
            return Err(InboundRejection::InvalidSignature);
        }

        let payload: JsonValue = serde_json::from_slice(&request.body)
            .map_err(|e| InboundRejection::malformed(format!("invalid JSON: {}", e)))?;

        Ok(AuthenticatedEvent {
            platform: Platform::Discord,
            payload,
        })
    }

    fn normalize(&self, event: &AuthenticatedEvent) -> Option<CanonicalEvent> {
        let relay: DiscordRelayEvent = serde_json::from_value(event.payload.clone()).ok()?;
        if relay.event != "MESSAGE_CREATE" {
            return None;
        }

        let occurred_at = relay
            .timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|dt| Timestamp::from_datetime(dt.with_timezone(&chrono::Utc)))
            .unwrap_or_else(Timestamp::now);

        Some(CanonicalEvent {
            platform: Platform::Discord,
            external_event_id: relay.id,
            external_chat_id: relay.guild_id?,
            external_thread_ref: relay.thread_id,
            author_external_id: relay.author.id,
            author_is_bot: relay.author.bot,
            text: relay.content,
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
        // A thread is a channel: posting into it targets the thread id.
        let target = thread_ref.unwrap_or(destination);
        let response: DiscordMessageResponse = self
            .rest_post(
                installation,
                &format!("/channels/{}/messages", target),
                &DiscordMessageRequest { content: text },
            )
            .await?;

        Ok(ExternalMessageRef {
            message_ref: response.id,
        })
    }

    async fn create_thread(
        &self,
        installation: &Installation,
        destination: &str,
        title: &str,
        body: &str,
    ) -> Result<ExternalThreadRef, DomainError> {
        let thread: DiscordThreadResponse = self
            .rest_post(
                installation,
                &format!("/channels/{}/threads", destination),
                &DiscordThreadRequest {
                    name: title,
                    kind: PUBLIC_THREAD,
                },
            )
            .await?;

        let _: DiscordMessageResponse = self
            .rest_post(
                installation,
                &format!("/channels/{}/messages", thread.id),
                &DiscordMessageRequest { content: body },
            )
            .await?;

        Ok(ExternalThreadRef {
            external_chat_id: installation.external_workspace_id.clone(),
            thread_ref: thread.id,
        })
    }
}
