//! In-memory implementations of the persistence ports.
//!
//! Used by the test suites and local development without a database. The
//! ledger preserves the production atomicity contract: one guarded set
//! insert, no separate check-then-insert round trips.

mod ledger;
mod repositories;
mod webhooks;

pub use ledger::InMemoryIdempotencyLedger;
pub use repositories::{
    InMemoryInstallationRepository, InMemoryMessageRepository, InMemoryTicketRepository,
};
pub use webhooks::{InMemoryWebhookDeliveryRepository, InMemoryWebhookEndpointRepository};
