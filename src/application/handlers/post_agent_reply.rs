//! Dashboard-agent replies: persist locally, mirror to the platform.
//!
//! The canonical message is the source of truth; mirroring into the
//! connected platform thread is best-effort and a failure is logged,
//! not thrown.

use std::sync::Arc;

use crate::adapters::registry::PlatformAdapters;
use crate::domain::foundation::{
    DomainError, ErrorCode, EventId, MessageId, SerializableDomainEvent, TicketId,
};
use crate::domain::installation::{Installation, Platform};
use crate::domain::ticket::{Message, MessageCreated, ThreadLink, Ticket};
use crate::ports::{
    EventPublisher, InstallationRepository, MessageRepository, PlatformAdapter, TicketRepository,
};

/// Command to post an agent reply from the dashboard.
#[derive(Debug, Clone)]
pub struct PostAgentReplyCommand {
    pub ticket_id: TicketId,
    pub text: String,
}

/// Handler for dashboard-agent replies.
pub struct PostAgentReplyHandler {
    tickets: Arc<dyn TicketRepository>,
    messages: Arc<dyn MessageRepository>,
    installations: Arc<dyn InstallationRepository>,
    adapters: PlatformAdapters,
    publisher: Arc<dyn EventPublisher>,
}

impl PostAgentReplyHandler {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        messages: Arc<dyn MessageRepository>,
        installations: Arc<dyn InstallationRepository>,
        adapters: PlatformAdapters,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            tickets,
            messages,
            installations,
            adapters,
            publisher,
        }
    }

    pub async fn handle(&self, cmd: PostAgentReplyCommand) -> Result<MessageId, DomainError> {
        let ticket = self
            .tickets
            .find_by_id(&cmd.ticket_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TicketNotFound,
                    format!("Ticket not found: {}", cmd.ticket_id),
                )
            })?;

        let message = Message::from_dashboard(ticket.id(), &cmd.text);
        self.messages.insert(&message).await?;

        let event = MessageCreated {
            event_id: EventId::new(),
            message_id: message.id,
            ticket_id: ticket.id(),
            tenant_id: ticket.tenant_id().clone(),
            source: message.source,
            text: message.text.clone(),
            occurred_at: message.created_at,
        };
        if let Err(e) = self.publisher.publish(event.to_envelope()).await {
            tracing::error!(message_id = %message.id, error = %e, "message.created publication failed");
        }

        // Mirror to the platform thread when one is linked.
        if let Some(link) = ticket.thread_link() {
            if let Err(e) = self.mirror(&ticket, link, &cmd.text).await {
                tracing::warn!(
                    ticket_id = %ticket.id(),
                    error = %e,
                    "Failed to mirror agent reply to platform thread"
                );
            }
        }

        Ok(message.id)
    }

    async fn mirror(
        &self,
        ticket: &Ticket,
        link: &ThreadLink,
        text: &str,
    ) -> Result<(), DomainError> {
        let Some(installation) = self.installations.find_by_tenant(ticket.tenant_id()).await?
        else {
            return Err(DomainError::platform_api("tenant has no installation"));
        };

        let destination = self.destination_for(&installation, link).await?;
        let adapter = self.adapters.for_platform(link.platform)?;
        adapter
            .post_message(&installation, &destination, text, Some(&link.thread_ref))
            .await?;
        Ok(())
    }

    /// Where a reply must be posted, per platform:
    /// - Slack threads live in the configured default channel
    /// - Discord threads are channels themselves
    /// - Telegram topics live in the supergroup chat
    async fn destination_for(
        &self,
        installation: &Installation,
        link: &ThreadLink,
    ) -> Result<String, DomainError> {
        match link.platform {
            Platform::Slack => {
                let channel = self
                    .installations
                    .default_channel(&installation.id)
                    .await?
                    .ok_or_else(|| DomainError::platform_api("tenant has no default channel"))?;
                Ok(channel.external_channel_id)
            }
            Platform::Discord => Ok(link.thread_ref.clone()),
            Platform::Telegram => Ok(link.external_chat_id.clone()),
        }
    }
}
