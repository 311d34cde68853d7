//! Telegram implementation of the PlatformAdapter port.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value as JsonValue;

use crate::config::TelegramConfig;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::installation::{Installation, Platform};
use crate::domain::pipeline::{CanonicalEvent, InboundRejection};
use crate::ports::{
    AuthenticatedEvent, ExternalMessageRef, ExternalThreadRef, InboundRequest, PlatformAdapter,
};

use super::types::{
    TelegramCreateForumTopic, TelegramForumTopic, TelegramMessage, TelegramResponse,
    TelegramSendMessage, TelegramUpdate,
};

/// Telegram platform adapter.
///
/// Inbound traffic does not arrive over HTTP webhooks; `verify` always
/// rejects. Updates reach `normalize` through the long-poll connector.
pub struct TelegramAdapter {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramAdapter {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url,
            self.config.bot_token.expose_secret(),
            method
        )
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, DomainError> {
        let response = self
            .http_client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::platform_api(format!("telegram request failed: {}", e)))?;

        let wrapper: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|e| DomainError::platform_api(format!("telegram response unreadable: {}", e)))?;

        if !wrapper.ok {
            let reason = wrapper
                .description
                .unwrap_or_else(|| "unknown error".to_string());
            tracing::warn!(method = %method, error = %reason, "Telegram Bot API call failed");
            return Err(DomainError::platform_api(format!("telegram {}: {}", method, reason)));
        }

        wrapper
            .result
            .ok_or_else(|| DomainError::platform_api(format!("telegram {}: ok without result", method)))
    }

    /// Fetch the next batch of updates as raw JSON, blocking server-side
    /// up to the configured poll timeout. Used by the connector, which
    /// needs the raw payload for the canonical event's audit field.
    pub(super) async fn get_updates(&self, offset: i64) -> Result<Vec<JsonValue>, DomainError> {
        self.call(
            "getUpdates",
            &super::types::TelegramGetUpdates {
                offset,
                timeout: self.config.poll_timeout_secs,
                allowed_updates: vec!["message"],
            },
        )
        .await
    }
}

#[async_trait]
impl PlatformAdapter for TelegramAdapter {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    fn verify(&self, _request: &InboundRequest) -> Result<AuthenticatedEvent, InboundRejection> {
        // Telegram events arrive over the authenticated long-poll stream,
        // not discrete webhook calls; there is nothing to verify here.
        Err(InboundRejection::malformed(
            "telegram events arrive via the stream connector",
        ))
    }

    fn normalize(&self, event: &AuthenticatedEvent) -> Option<CanonicalEvent> {
        let update: TelegramUpdate = serde_json::from_value(event.payload.clone()).ok()?;
        let message: TelegramMessage = update.message?;

        // Only group/supergroup traffic can belong to ticket topics.
        if message.chat.chat_type != "supergroup" && message.chat.chat_type != "group" {
            return None;
        }

        let from = message.from?;

        Some(CanonicalEvent {
            platform: Platform::Telegram,
            external_event_id: update.update_id.to_string(),
            external_chat_id: message.chat.id.to_string(),
            external_thread_ref: message.message_thread_id.map(|id| id.to_string()),
            author_external_id: from.id.to_string(),
            author_is_bot: from.is_bot,
            text: message.text.unwrap_or_default(),
            occurred_at: Timestamp::from_unix_secs(message.date),
            raw: event.payload.clone(),
        })
    }

    async fn post_message(
        &self,
        _installation: &Installation,
        destination: &str,
        text: &str,
        thread_ref: Option<&str>,
    ) -> Result<ExternalMessageRef, DomainError> {
        let message_thread_id = thread_ref.and_then(|t| t.parse::<i64>().ok());
        let message: TelegramMessage = self
            .call(
                "sendMessage",
                &TelegramSendMessage {
                    chat_id: destination,
                    text,
                    message_thread_id,
                },
            )
            .await?;

        Ok(ExternalMessageRef {
            message_ref: message.message_id.to_string(),
        })
    }

    async fn create_thread(
        &self,
        _installation: &Installation,
        destination: &str,
        title: &str,
        body: &str,
    ) -> Result<ExternalThreadRef, DomainError> {
        let topic: TelegramForumTopic = self
            .call(
                "createForumTopic",
                &TelegramCreateForumTopic {
                    chat_id: destination,
                    name: title,
                },
            )
            .await?;

        let _: TelegramMessage = self
            .call(
                "sendMessage",
                &TelegramSendMessage {
                    chat_id: destination,
                    text: body,
                    message_thread_id: Some(topic.message_thread_id),
                },
            )
            .await?;

        Ok(ExternalThreadRef {
            external_chat_id: destination.to_string(),
            thread_ref: topic.message_thread_id.to_string(),
        })
    }
}
