//! IdempotencyLedger port - at-most-once application of external events.
//!
//! External platforms deliver at-least-once: network retries, our own slow
//! responses, and redelivery after restarts all produce duplicates. The
//! ledger is the single concurrency-control primitive of the pipeline.
//!
//! ## Atomicity
//!
//! `check_and_mark` MUST be one atomic operation (a unique-constraint
//! insert where the constraint violation is the duplicate signal). A
//! check-then-insert with two round trips races under concurrent delivery
//! and is forbidden. Records are append-only with no TTL: platform retry
//! windows are unbounded in practice.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::installation::Platform;

/// Result of attempting to record an external event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerDecision {
    /// First time this event was seen; the caller proceeds.
    Fresh,
    /// The event was applied before; the caller skips.
    Duplicate,
}

/// Port for the append-only idempotency ledger.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// Atomically record `(platform, chat id, event id)` and report
    /// whether it was fresh.
    ///
    /// # Errors
    ///
    /// Only datastore failures; duplicates are a decision, not an error.
    async fn check_and_mark(
        &self,
        platform: Platform,
        external_chat_id: &str,
        external_event_id: &str,
    ) -> Result<LedgerDecision, DomainError>;
}
