//! In-process event bus wiring domain events to registered handlers.
//!
//! This is the production bus for a single-process deployment: publishing
//! invokes every handler registered for the event type. Handlers are
//! isolated; a handler error is logged and never affects other handlers
//! or the publisher. (The pipeline's correctness never depends on a bus
//! handler succeeding: webhook deliveries persist their own state and
//! viewer fan-out is best-effort by contract.)

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

type HandlerMap = HashMap<String, Vec<Arc<dyn EventHandler>>>;

/// Poisoned-lock recovery: the handler map is append-only registration
/// state, safe to reuse.
fn read(lock: &RwLock<HandlerMap>) -> std::sync::RwLockReadGuard<'_, HandlerMap> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<HandlerMap>) -> std::sync::RwLockWriteGuard<'_, HandlerMap> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Single-process event bus.
pub struct LocalEventBus {
    handlers: RwLock<HandlerMap>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Handlers registered for an event type, cloned out of the lock so
    /// no lock is held across handler await points.
    fn handlers_for(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        read(&self.handlers)
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for LocalEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        for handler in self.handlers_for(&event.event_type) {
            if let Err(e) = handler.handle(event.clone()).await {
                tracing::error!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    event_id = %event.event_id,
                    error = %e,
                    "Event handler failed"
                );
            }
        }
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

impl EventSubscriber for LocalEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        write(&self.handlers)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        for event_type in event_types {
            self.subscribe(event_type, handler.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        count: AtomicUsize,
    }

    #[async_trait]
    impl EventHandler for Counting {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "boom"))
        }

        fn name(&self) -> &'static str {
            "Failing"
        }
    }

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, "agg-1", "Test", serde_json::json!({}))
    }

    #[tokio::test]
    async fn publish_invokes_matching_handlers_only() {
        let bus = LocalEventBus::new();
        let handler = Arc::new(Counting {
            count: AtomicUsize::new(0),
        });
        bus.subscribe("message.created", handler.clone());

        bus.publish(envelope("message.created")).await.unwrap();
        bus.publish(envelope("ticket.created")).await.unwrap();

        assert_eq!(handler.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_failure_does_not_stop_other_handlers() {
        let bus = LocalEventBus::new();
        let counting = Arc::new(Counting {
            count: AtomicUsize::new(0),
        });
        bus.subscribe("ticket.updated", Arc::new(Failing));
        bus.subscribe("ticket.updated", counting.clone());

        // Publish succeeds despite the failing handler.
        bus.publish(envelope("ticket.updated")).await.unwrap();

        assert_eq!(counting.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribe_all_registers_for_each_type() {
        let bus = LocalEventBus::new();
        let handler = Arc::new(Counting {
            count: AtomicUsize::new(0),
        });
        bus.subscribe_all(&["ticket.created", "ticket.updated"], handler.clone());

        bus.publish(envelope("ticket.created")).await.unwrap();
        bus.publish(envelope("ticket.updated")).await.unwrap();

        assert_eq!(handler.count.load(Ordering::SeqCst), 2);
    }
}
