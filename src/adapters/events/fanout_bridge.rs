//! Bridge between the event bus and the per-ticket viewer feed.
//!
//! Subscribes to `message.created` and republishes the payload to the
//! ticket's live subscribers through [`TicketFeed`]. Events whose payload
//! cannot be routed to a ticket are skipped at debug level.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::domain::ticket::MessageCreated;
use crate::ports::{EventHandler, EventSubscriber};

use super::ticket_feed::{TicketFeed, TicketMessagePayload};

/// Event types forwarded to live viewers.
pub const FEED_EVENT_TYPES: &[&str] = &["message.created"];

/// Bus handler republishing messages onto the viewer feed.
pub struct TicketFeedBridge {
    feed: TicketFeed,
}

impl TicketFeedBridge {
    pub fn new(feed: TicketFeed) -> Self {
        Self { feed }
    }

    /// Register this bridge on an event bus.
    pub fn register(self: Arc<Self>, subscriber: &impl EventSubscriber) {
        subscriber.subscribe_all(FEED_EVENT_TYPES, self);
    }
}

#[async_trait]
impl EventHandler for TicketFeedBridge {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let created: MessageCreated = match event.payload_as() {
            Ok(created) => created,
            Err(e) => {
                tracing::debug!(
                    event_id = %event.event_id,
                    error = %e,
                    "message.created payload not routable to a ticket, skipping fan-out"
                );
                return Ok(());
            }
        };

        self.feed.publish(
            &created.ticket_id,
            TicketMessagePayload {
                message_id: created.message_id,
                ticket_id: created.ticket_id,
                source: created.source,
                text: created.text,
                created_at: created.occurred_at,
            },
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "TicketFeedBridge"
    }
}
