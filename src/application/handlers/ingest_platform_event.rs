//! The message ingestor: one canonical event in, one outcome out.
//!
//! The state machine, in order:
//! 1. own-bot check (echoes of our own posts are skipped even when no
//!    ticket would have matched)
//! 2. idempotency ledger check-and-mark
//! 3. ticket resolution
//! 4. canonical message creation
//! 5. `message.created` publication
//!
//! Skips are outcomes, never errors; only storage failures propagate, and
//! those are retried by the job runtime. The handler has no knowledge of
//! its caller, so the queued and inline execution modes behave
//! identically by construction.

use std::sync::Arc;

use crate::application::ThreadResolver;
use crate::domain::foundation::{DomainError, EventId, SerializableDomainEvent};
use crate::domain::pipeline::{CanonicalEvent, IngestOutcome, SkipReason};
use crate::domain::ticket::{Message, MessageCreated};
use crate::ports::{EventPublisher, IdempotencyLedger, LedgerDecision, MessageRepository};

/// Handler for ingesting verified platform events.
pub struct IngestPlatformEventHandler {
    resolver: Arc<ThreadResolver>,
    ledger: Arc<dyn IdempotencyLedger>,
    messages: Arc<dyn MessageRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl IngestPlatformEventHandler {
    pub fn new(
        resolver: Arc<ThreadResolver>,
        ledger: Arc<dyn IdempotencyLedger>,
        messages: Arc<dyn MessageRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            resolver,
            ledger,
            messages,
            publisher,
        }
    }

    pub async fn handle(&self, event: CanonicalEvent) -> Result<IngestOutcome, DomainError> {
        // 1. Resolve the owning installation; traffic from chats no
        //    tenant connected is not ours.
        let Some(resolution) = self
            .resolver
            .resolve(
                event.platform,
                &event.external_chat_id,
                event.external_thread_ref.as_deref(),
            )
            .await?
        else {
            return Ok(IngestOutcome::Skipped(SkipReason::NoMatchingTicket));
        };

        // 2. Drop echoes of our own bot before touching the ledger, so
        //    the skip reason is stable across redeliveries.
        if event.author_is_bot
            && resolution
                .installation
                .is_own_bot(&event.author_external_id)
        {
            tracing::debug!(
                platform = %event.platform,
                event_id = %event.external_event_id,
                "Skipping own bot message"
            );
            return Ok(IngestOutcome::Skipped(SkipReason::OwnBotMessage));
        }

        // 3. At-most-once gate. The atomic insert resolves concurrent
        //    duplicate deliveries; losers see Duplicate.
        let decision = self
            .ledger
            .check_and_mark(
                event.platform,
                &event.external_chat_id,
                &event.external_event_id,
            )
            .await?;
        if decision == LedgerDecision::Duplicate {
            tracing::debug!(
                platform = %event.platform,
                event_id = %event.external_event_id,
                "Skipping duplicate event"
            );
            return Ok(IngestOutcome::Skipped(SkipReason::Duplicate));
        }

        // 4. The event must land in a ticket's thread.
        let Some(ticket) = resolution.ticket else {
            return Ok(IngestOutcome::Skipped(SkipReason::NoMatchingTicket));
        };

        // 5. Create the canonical message with the raw payload attached.
        let message = Message::from_platform(
            ticket.id(),
            event.text.clone(),
            event.author_external_id.clone(),
            event.external_event_id.clone(),
            event.raw.clone(),
        );
        self.messages.insert(&message).await?;

        // 6. Fan out. Failure here must not undo the ingest: the bus
        //    logs and the message stands.
        let created = MessageCreated {
            event_id: EventId::new(),
            message_id: message.id,
            ticket_id: ticket.id(),
            tenant_id: ticket.tenant_id().clone(),
            source: message.source,
            text: message.text.clone(),
            occurred_at: message.created_at,
        };
        if let Err(e) = self.publisher.publish(created.to_envelope()).await {
            tracing::error!(
                message_id = %message.id,
                error = %e,
                "message.created publication failed"
            );
        }

        tracing::info!(
            platform = %event.platform,
            ticket_id = %ticket.id(),
            message_id = %message.id,
            "Ingested platform message"
        );

        Ok(IngestOutcome::Processed {
            message_id: message.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::{
        InMemoryIdempotencyLedger, InMemoryInstallationRepository, InMemoryMessageRepository,
        InMemoryTicketRepository,
    };
    use crate::domain::foundation::{TenantId, Timestamp, VisitorId};
    use crate::domain::installation::{Installation, Platform};
    use crate::domain::ticket::{ThreadLink, Ticket};
    use crate::ports::{InstallationRepository, TicketRepository};
    use serde_json::json;

    struct Fixture {
        handler: IngestPlatformEventHandler,
        tickets: Arc<InMemoryTicketRepository>,
        installations: Arc<InMemoryInstallationRepository>,
        messages: Arc<InMemoryMessageRepository>,
        bus: Arc<InMemoryEventBus>,
    }

    fn fixture() -> Fixture {
        let tickets = Arc::new(InMemoryTicketRepository::new());
        let installations = Arc::new(InMemoryInstallationRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let ledger = Arc::new(InMemoryIdempotencyLedger::new());
        let resolver = Arc::new(ThreadResolver::new(installations.clone(), tickets.clone()));

        Fixture {
            handler: IngestPlatformEventHandler::new(
                resolver,
                ledger,
                messages.clone(),
                bus.clone(),
            ),
            tickets,
            installations,
            messages,
            bus,
        }
    }

    async fn seed(fixture: &Fixture) -> Ticket {
        let installation = Installation::new(
            TenantId::from_string("acct-1"),
            Platform::Slack,
            "C1",
            "xoxb-token",
            "U0BOT",
        );
        fixture.installations.save(&installation).await.unwrap();

        let mut ticket = Ticket::open(
            TenantId::from_string("acct-1"),
            VisitorId::from_string("vis-1"),
            "Help",
        );
        ticket
            .link_thread(ThreadLink::new(Platform::Slack, "C1", "T1"))
            .unwrap();
        fixture.tickets.save(&ticket).await.unwrap();
        ticket
    }

    fn event(event_id: &str) -> CanonicalEvent {
        CanonicalEvent {
            platform: Platform::Slack,
            external_event_id: event_id.to_string(),
            external_chat_id: "C1".to_string(),
            external_thread_ref: Some("T1".to_string()),
            author_external_id: "U777".to_string(),
            author_is_bot: false,
            text: "hello".to_string(),
            occurred_at: Timestamp::now(),
            raw: json!({"ts": "1.2"}),
        }
    }

    #[tokio::test]
    async fn fresh_event_creates_exactly_one_message() {
        let f = fixture();
        let ticket = seed(&f).await;

        let outcome = f.handler.handle(event("E1")).await.unwrap();

        match outcome {
            IngestOutcome::Processed { message_id } => {
                let stored = f.messages.get(&message_id).await.unwrap();
                assert_eq!(stored.ticket_id, ticket.id());
                assert_eq!(stored.text, "hello");
                assert_eq!(stored.platform_event_id.as_deref(), Some("E1"));
                assert!(stored.raw.is_some());
            }
            other => panic!("expected processed, got {:?}", other),
        }

        assert_eq!(f.messages.len().await, 1);
        assert_eq!(f.bus.events_of_type("message.created").len(), 1);
    }

    #[tokio::test]
    async fn replay_yields_at_most_one_message() {
        let f = fixture();
        seed(&f).await;

        assert!(f.handler.handle(event("E1")).await.unwrap().is_processed());

        for _ in 0..3 {
            let outcome = f.handler.handle(event("E1")).await.unwrap();
            assert_eq!(outcome, IngestOutcome::Skipped(SkipReason::Duplicate));
        }

        assert_eq!(f.messages.len().await, 1);
        assert_eq!(f.bus.events_of_type("message.created").len(), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicates_create_one_message() {
        let f = fixture();
        seed(&f).await;
        let handler = Arc::new(f.handler);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handler = handler.clone();
                tokio::spawn(async move { handler.handle(event("E-race")).await.unwrap() })
            })
            .collect();

        let mut processed = 0;
        for task in tasks {
            if task.await.unwrap().is_processed() {
                processed += 1;
            }
        }

        assert_eq!(processed, 1);
        assert_eq!(f.messages.len().await, 1);
    }

    #[tokio::test]
    async fn own_bot_message_skipped_even_without_ticket() {
        let f = fixture();
        seed(&f).await;

        let mut bot_event = event("E2");
        bot_event.author_is_bot = true;
        bot_event.author_external_id = "U0BOT".to_string();
        // Point at a thread no ticket is linked to.
        bot_event.external_thread_ref = Some("T-none".to_string());

        let outcome = f.handler.handle(bot_event).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Skipped(SkipReason::OwnBotMessage));
        assert_eq!(f.messages.len().await, 0);
    }

    #[tokio::test]
    async fn foreign_bot_messages_are_ingested() {
        let f = fixture();
        seed(&f).await;

        let mut bot_event = event("E3");
        bot_event.author_is_bot = true;
        bot_event.author_external_id = "B-some-other-bot".to_string();

        assert!(f.handler.handle(bot_event).await.unwrap().is_processed());
    }

    #[tokio::test]
    async fn unrelated_thread_is_skipped_not_errored() {
        let f = fixture();
        seed(&f).await;

        let mut unrelated = event("E4");
        unrelated.external_thread_ref = Some("T-unrelated".to_string());

        let outcome = f.handler.handle(unrelated).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Skipped(SkipReason::NoMatchingTicket));
    }

    #[tokio::test]
    async fn unknown_workspace_is_skipped() {
        let f = fixture();
        seed(&f).await;

        let mut foreign = event("E5");
        foreign.external_chat_id = "C-foreign".to_string();

        let outcome = f.handler.handle(foreign).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Skipped(SkipReason::NoMatchingTicket));
        assert_eq!(f.messages.len().await, 0);
    }
}
