//! Open a ticket for a visitor's first message and mirror it into the
//! tenant's chat platform as a new thread/topic.
//!
//! The local writes always come first and always stand: a platform-side
//! failure leaves the ticket without a thread link (no permalink in the
//! dashboard, visibly distinguishable) instead of losing the ticket.

use std::sync::Arc;

use crate::adapters::registry::PlatformAdapters;
use crate::domain::foundation::{DomainError, EventId, SerializableDomainEvent, TenantId, TicketId, VisitorId};
use crate::domain::ticket::{Message, MessageCreated, ThreadLink, Ticket, TicketCreated};
use crate::ports::{
    EventPublisher, InstallationRepository, MessageRepository, PlatformAdapter, TicketRepository,
};

/// Command to open a ticket from the widget.
#[derive(Debug, Clone)]
pub struct OpenTicketThreadCommand {
    pub tenant_id: TenantId,
    pub visitor_id: VisitorId,
    pub subject: String,
    pub first_message: String,
}

/// Result of opening a ticket.
#[derive(Debug, Clone)]
pub struct OpenTicketThreadResult {
    pub ticket_id: TicketId,
    /// Whether the platform-side thread was created and linked.
    pub thread_linked: bool,
}

/// Handler creating tickets and their platform threads.
pub struct OpenTicketThreadHandler {
    tickets: Arc<dyn TicketRepository>,
    messages: Arc<dyn MessageRepository>,
    installations: Arc<dyn InstallationRepository>,
    adapters: PlatformAdapters,
    publisher: Arc<dyn EventPublisher>,
}

impl OpenTicketThreadHandler {
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

    pub async fn handle(
        &self,
        cmd: OpenTicketThreadCommand,
    ) -> Result<OpenTicketThreadResult, DomainError> {
        // 1. Local ticket and first message. These writes are the source
        //    of truth and never depend on the platform being reachable.
        let mut ticket = Ticket::open(cmd.tenant_id.clone(), cmd.visitor_id.clone(), &cmd.subject);
        self.tickets.save(&ticket).await?;

        let message = Message::from_visitor(ticket.id(), &cmd.first_message);
        self.messages.insert(&message).await?;

        // 2. Announce locally before touching the platform.
        self.publish_created(&ticket).await;
        self.publish_message(&ticket, &message).await;

        // 3. Mirror into the platform. Failure is logged and surfaced
        //    through the missing thread link, never thrown.
        let thread_linked = match self.create_platform_thread(&mut ticket, &cmd).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    ticket_id = %ticket.id(),
                    error = %e,
                    "Platform thread creation failed; ticket kept without link"
                );
                false
            }
        };

        Ok(OpenTicketThreadResult {
            ticket_id: ticket.id(),
            thread_linked,
        })
    }

    async fn create_platform_thread(
        &self,
        ticket: &mut Ticket,
        cmd: &OpenTicketThreadCommand,
    ) -> Result<(), DomainError> {
        let Some(installation) = self.installations.find_by_tenant(&cmd.tenant_id).await? else {
            return Err(DomainError::platform_api("tenant has no installation"));
        };

        let Some(channel) = self.installations.default_channel(&installation.id).await? else {
            return Err(DomainError::platform_api("tenant has no default channel"));
        };

        let adapter = self.adapters.for_platform(installation.platform)?;
        let thread = adapter
            .create_thread(
                &installation,
                &channel.external_channel_id,
                &cmd.subject,
                &cmd.first_message,
            )
            .await?;

        ticket.link_thread(ThreadLink::new(
            installation.platform,
            thread.external_chat_id,
            thread.thread_ref,
        ))?;
        self.tickets.update(ticket).await?;

        Ok(())
    }

    async fn publish_created(&self, ticket: &Ticket) {
        let event = TicketCreated {
            event_id: EventId::new(),
            ticket_id: ticket.id(),
            tenant_id: ticket.tenant_id().clone(),
            visitor_id: ticket.visitor_id().clone(),
            subject: ticket.subject().to_string(),
            status: ticket.status(),
            created_at: ticket.created_at(),
        };
        if let Err(e) = self.publisher.publish(event.to_envelope()).await {
            tracing::error!(ticket_id = %ticket.id(), error = %e, "ticket.created publication failed");
        }
    }

    async fn publish_message(&self, ticket: &Ticket, message: &Message) {
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
    }
}
