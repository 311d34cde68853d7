//! EventPublisher port - publishing domain events.
//!
//! The domain publishes events without knowing the transport. Delivery is
//! at-least-once: handlers may receive duplicates and must tolerate them
//! (the pipeline's idempotency ledger exists for exactly this reason).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event envelope.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish multiple events sequentially with best-effort delivery.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait is object-safe.
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}
}
