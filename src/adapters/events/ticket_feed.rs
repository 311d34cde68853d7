//! Per-ticket fan-out broker for live viewers.
//!
//! Decouples "message created" producers from connected dashboard
//! viewers. Subscriptions are reference-counted per ticket: the broadcast
//! channel for a ticket is created by its first subscriber and torn down
//! when the last unsubscribes, bounding resource usage under many idle
//! tickets.
//!
//! # Concurrency
//!
//! The topic registry is the only shared mutable state; one `std` mutex
//! serializes registry mutation. Publishing clones the sender out of the
//! lock and sends without holding it. Unsubscribe is deterministic: the
//! subscription guard releases the topic on drop, so cleanup never
//! depends on closure lifetimes.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::domain::foundation::{MessageId, TicketId, Timestamp};
use crate::domain::ticket::MessageSource;

/// Default per-ticket channel capacity. Slow viewers miss frames past
/// this bound rather than stalling producers.
const DEFAULT_CAPACITY: usize = 128;

/// Payload fanned out to viewers for every canonical message.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessagePayload {
    pub message_id: MessageId,
    pub ticket_id: TicketId,
    pub source: MessageSource,
    pub text: String,
    pub created_at: Timestamp,
}

struct FeedInner {
    topics: Mutex<HashMap<TicketId, broadcast::Sender<TicketMessagePayload>>>,
    capacity: usize,
}

impl FeedInner {
    fn release(&self, ticket_id: &TicketId) {
        let mut topics = lock(&self.topics);
        if let Some(sender) = topics.get(ticket_id) {
            if sender.receiver_count() == 0 {
                topics.remove(ticket_id);
            }
        }
    }
}

/// Poisoned-lock recovery: registry state is a plain map, safe to reuse.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The fan-out broker. Cheap to clone; all clones share the registry.
#[derive(Clone)]
pub struct TicketFeed {
    inner: Arc<FeedInner>,
}

impl TicketFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                topics: Mutex::new(HashMap::new()),
                capacity,
            }),
        }
    }

    /// Subscribe to a ticket's message stream.
    ///
    /// Opens the underlying topic on the first subscriber. The returned
    /// subscription unsubscribes on drop.
    pub fn subscribe(&self, ticket_id: TicketId) -> TicketSubscription {
        let receiver = {
            let mut topics = lock(&self.inner.topics);
            let sender = topics.entry(ticket_id).or_insert_with(|| {
                let (tx, _) = broadcast::channel(self.inner.capacity);
                tx
            });
            sender.subscribe()
        };

        TicketSubscription {
            receiver: Some(receiver),
            ticket_id,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Publish a message payload to a ticket's subscribers.
    ///
    /// A no-op when nobody is watching the ticket. Best-effort: send
    /// errors (no receivers) are ignored.
    pub fn publish(&self, ticket_id: &TicketId, payload: TicketMessagePayload) {
        let sender = {
            let topics = lock(&self.inner.topics);
            topics.get(ticket_id).cloned()
        };

        if let Some(sender) = sender {
            let _ = sender.send(payload);
        }
    }

    /// Number of live subscribers for a ticket.
    pub fn subscriber_count(&self, ticket_id: &TicketId) -> usize {
        lock(&self.inner.topics)
            .get(ticket_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Number of tickets with an open topic.
    pub fn active_topics(&self) -> usize {
        lock(&self.inner.topics).len()
    }
}

impl Default for TicketFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to one ticket's stream.
///
/// Dropping the subscription synchronously releases the broker-level
/// topic when it was the last subscriber.
pub struct TicketSubscription {
    receiver: Option<broadcast::Receiver<TicketMessagePayload>>,
    ticket_id: TicketId,
    inner: Arc<FeedInner>,
}

impl TicketSubscription {
    /// Receive the next payload.
    ///
    /// Returns `None` when the subscription lagged past capacity had the
    /// stream closed; lagging subscribers skip to the oldest retained
    /// frame instead of erroring out.
    pub async fn recv(&mut self) -> Option<TicketMessagePayload> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        ticket_id = %self.ticket_id,
                        skipped,
                        "Viewer lagged behind ticket stream"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }
}

impl Drop for TicketSubscription {
    fn drop(&mut self) {
        // Drop the receiver first so the refcount check sees it gone.
        self.receiver.take();
        self.inner.release(&self.ticket_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(ticket_id: TicketId, text: &str) -> TicketMessagePayload {
        TicketMessagePayload {
            message_id: MessageId::new(),
            ticket_id,
            source: MessageSource::Visitor,
            text: text.to_string(),
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_payload() {
        let feed = TicketFeed::new();
        let ticket = TicketId::new();

        let mut subscription = feed.subscribe(ticket);
        feed.publish(&ticket, payload(ticket, "hello"));

        let received = subscription.recv().await.unwrap();
        assert_eq!(received.text, "hello");
    }

    #[tokio::test]
    async fn publish_is_isolated_per_ticket() {
        let feed = TicketFeed::new();
        let ticket_a = TicketId::new();
        let ticket_b = TicketId::new();

        let mut sub_a = feed.subscribe(ticket_a);
        let _sub_b = feed.subscribe(ticket_b);

        feed.publish(&ticket_a, payload(ticket_a, "for A"));

        let received = sub_a.recv().await.unwrap();
        assert_eq!(received.ticket_id, ticket_a);

        // B got nothing: its topic has no queued frame.
        assert_eq!(feed.subscriber_count(&ticket_b), 1);
    }

    #[tokio::test]
    async fn all_subscribers_of_a_ticket_receive() {
        let feed = TicketFeed::new();
        let ticket = TicketId::new();

        let mut first = feed.subscribe(ticket);
        let mut second = feed.subscribe(ticket);

        feed.publish(&ticket, payload(ticket, "both"));

        assert_eq!(first.recv().await.unwrap().text, "both");
        assert_eq!(second.recv().await.unwrap().text, "both");
    }

    #[test]
    fn topic_opens_on_first_subscriber_and_closes_on_last() {
        let feed = TicketFeed::new();
        let ticket = TicketId::new();
        assert_eq!(feed.active_topics(), 0);

        let first = feed.subscribe(ticket);
        let second = feed.subscribe(ticket);
        assert_eq!(feed.active_topics(), 1);
        assert_eq!(feed.subscriber_count(&ticket), 2);

        drop(first);
        assert_eq!(feed.active_topics(), 1);

        drop(second);
        assert_eq!(feed.active_topics(), 0);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let feed = TicketFeed::new();
        let ticket = TicketId::new();
        feed.publish(&ticket, payload(ticket, "nobody"));
        assert_eq!(feed.active_topics(), 0);
    }

    #[tokio::test]
    async fn lagged_subscriber_skips_rather_than_dies() {
        let feed = TicketFeed::with_capacity(2);
        let ticket = TicketId::new();
        let mut subscription = feed.subscribe(ticket);

        for i in 0..5 {
            feed.publish(&ticket, payload(ticket, &format!("m{}", i)));
        }

        // The oldest retained frame after overflow, not an error.
        let received = subscription.recv().await.unwrap();
        assert_eq!(received.text, "m3");
    }

    #[tokio::test]
    async fn recv_after_release_returns_none() {
        let feed = TicketFeed::new();
        let ticket = TicketId::new();
        let mut subscription = feed.subscribe(ticket);

        // Simulate the feed itself going away: drop all senders by
        // removing the topic.
        lock(&feed.inner.topics).remove(&ticket);

        assert!(subscription.recv().await.is_none());
    }

    #[test]
    fn payload_serializes_camel_case() {
        let ticket = TicketId::new();
        let json = serde_json::to_value(payload(ticket, "x")).unwrap();
        assert!(json.get("messageId").is_some());
        assert!(json.get("ticketId").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
