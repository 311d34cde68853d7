//! Domain events emitted by the ticket aggregate.
//!
//! These event types form the outbound webhook contract (`ticket.created`,
//! `message.created`, `ticket.updated`); renaming them breaks consumers.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, MessageId, TenantId, TicketId, Timestamp, VisitorId};
use crate::domain_event;

use super::{MessageSource, TicketStatus};

/// A visitor opened a new ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCreated {
    pub event_id: EventId,
    pub ticket_id: TicketId,
    pub tenant_id: TenantId,
    pub visitor_id: VisitorId,
    pub subject: String,
    pub status: TicketStatus,
    pub created_at: Timestamp,
}

domain_event!(
    TicketCreated,
    event_type = "ticket.created",
    aggregate_id = ticket_id,
    aggregate_type = "Ticket",
    occurred_at = created_at,
    event_id = event_id
);

/// A ticket's status changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketUpdated {
    pub event_id: EventId,
    pub ticket_id: TicketId,
    pub tenant_id: TenantId,
    pub status: TicketStatus,
    pub occurred_at: Timestamp,
}

domain_event!(
    TicketUpdated,
    event_type = "ticket.updated",
    aggregate_id = ticket_id,
    aggregate_type = "Ticket",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A canonical message was created on a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreated {
    pub event_id: EventId,
    pub message_id: MessageId,
    pub ticket_id: TicketId,
    pub tenant_id: TenantId,
    pub source: MessageSource,
    pub text: String,
    pub occurred_at: Timestamp,
}

domain_event!(
    MessageCreated,
    event_type = "message.created",
    aggregate_id = message_id,
    aggregate_type = "Message",
    occurred_at = occurred_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainEvent, SerializableDomainEvent};

    #[test]
    fn ticket_created_envelope_routes_by_ticket() {
        let event = TicketCreated {
            event_id: EventId::from_string("evt-1"),
            ticket_id: TicketId::new(),
            tenant_id: TenantId::from_string("acct-1"),
            visitor_id: VisitorId::from_string("vis-1"),
            subject: "Help".to_string(),
            status: TicketStatus::Open,
            created_at: Timestamp::now(),
        };

        let envelope = event.to_envelope();
        assert_eq!(envelope.event_type, "ticket.created");
        assert_eq!(envelope.aggregate_type, "Ticket");
        assert_eq!(envelope.aggregate_id, event.ticket_id.to_string());
    }

    #[test]
    fn message_created_payload_exposes_ticket_id() {
        let ticket_id = TicketId::new();
        let event = MessageCreated {
            event_id: EventId::new(),
            message_id: MessageId::new(),
            ticket_id,
            tenant_id: TenantId::from_string("acct-1"),
            source: MessageSource::Visitor,
            text: "hello".to_string(),
            occurred_at: Timestamp::now(),
        };

        let envelope = event.to_envelope();
        // Fan-out routing reads the ticket id from the payload.
        assert_eq!(
            envelope.payload["ticket_id"].as_str().unwrap(),
            ticket_id.to_string()
        );
        assert_eq!(envelope.payload["source"], "visitor");
    }

    #[test]
    fn ticket_updated_carries_new_status() {
        let event = TicketUpdated {
            event_id: EventId::new(),
            ticket_id: TicketId::new(),
            tenant_id: TenantId::from_string("acct-1"),
            status: TicketStatus::Resolved,
            occurred_at: Timestamp::now(),
        };
        assert_eq!(event.event_type(), "ticket.updated");
        assert_eq!(event.to_envelope().payload["status"], "resolved");
    }
}
