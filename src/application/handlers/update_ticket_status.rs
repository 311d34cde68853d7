//! Ticket status mutations from tenant agents or platform commands.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, EventId, SerializableDomainEvent, TicketId, Timestamp};
use crate::domain::ticket::{TicketStatus, TicketUpdated};
use crate::ports::{EventPublisher, TicketRepository};

/// Command to change a ticket's status.
#[derive(Debug, Clone)]
pub struct UpdateTicketStatusCommand {
    pub ticket_id: TicketId,
    pub status: TicketStatus,
}

/// Handler for status changes; emits `ticket.updated` when the status
/// actually changed, which flows to webhooks like any other event.
pub struct UpdateTicketStatusHandler {
    tickets: Arc<dyn TicketRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl UpdateTicketStatusHandler {
    pub fn new(tickets: Arc<dyn TicketRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { tickets, publisher }
    }

    pub async fn handle(&self, cmd: UpdateTicketStatusCommand) -> Result<bool, DomainError> {
        let mut ticket = self
            .tickets
            .find_by_id(&cmd.ticket_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TicketNotFound,
                    format!("Ticket not found: {}", cmd.ticket_id),
                )
            })?;

        if !ticket.set_status(cmd.status) {
            return Ok(false);
        }
        self.tickets.update(&ticket).await?;

        let event = TicketUpdated {
            event_id: EventId::new(),
            ticket_id: ticket.id(),
            tenant_id: ticket.tenant_id().clone(),
            status: ticket.status(),
            occurred_at: Timestamp::now(),
        };
        if let Err(e) = self.publisher.publish(event.to_envelope()).await {
            tracing::error!(ticket_id = %ticket.id(), error = %e, "ticket.updated publication failed");
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryTicketRepository;
    use crate::domain::foundation::{TenantId, VisitorId};
    use crate::domain::ticket::Ticket;

    fn fixture() -> (
        UpdateTicketStatusHandler,
        Arc<InMemoryTicketRepository>,
        Arc<InMemoryEventBus>,
    ) {
        let tickets = Arc::new(InMemoryTicketRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        (
            UpdateTicketStatusHandler::new(tickets.clone(), bus.clone()),
            tickets,
            bus,
        )
    }

    #[tokio::test]
    async fn status_change_persists_and_publishes() {
        let (handler, tickets, bus) = fixture();
        let ticket = Ticket::open(
            TenantId::from_string("acct-1"),
            VisitorId::from_string("vis-1"),
            "Help",
        );
        tickets.save(&ticket).await.unwrap();

        let changed = handler
            .handle(UpdateTicketStatusCommand {
                ticket_id: ticket.id(),
                status: TicketStatus::Resolved,
            })
            .await
            .unwrap();

        assert!(changed);
        assert_eq!(
            tickets.find_by_id(&ticket.id()).await.unwrap().unwrap().status(),
            TicketStatus::Resolved
        );
        assert_eq!(bus.events_of_type("ticket.updated").len(), 1);
    }

    #[tokio::test]
    async fn same_status_is_a_silent_noop() {
        let (handler, tickets, bus) = fixture();
        let ticket = Ticket::open(
            TenantId::from_string("acct-1"),
            VisitorId::from_string("vis-1"),
            "Help",
        );
        tickets.save(&ticket).await.unwrap();

        let changed = handler
            .handle(UpdateTicketStatusCommand {
                ticket_id: ticket.id(),
                status: TicketStatus::Open,
            })
            .await
            .unwrap();

        assert!(!changed);
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn missing_ticket_errors() {
        let (handler, _tickets, _bus) = fixture();
        let err = handler
            .handle(UpdateTicketStatusCommand {
                ticket_id: TicketId::new(),
                status: TicketStatus::Closed,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TicketNotFound);
    }
}
