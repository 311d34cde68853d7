//! PostgreSQL implementations of the persistence ports.

mod idempotency_ledger;
mod installation_repository;
mod message_repository;
mod ticket_repository;
mod webhook_deliveries;
mod webhook_endpoints;

pub use idempotency_ledger::PostgresIdempotencyLedger;
pub use installation_repository::PostgresInstallationRepository;
pub use message_repository::PostgresMessageRepository;
pub use ticket_repository::PostgresTicketRepository;
pub use webhook_deliveries::PostgresWebhookDeliveryRepository;
pub use webhook_endpoints::PostgresWebhookEndpointRepository;

use crate::domain::foundation::DomainError;

/// Shared sqlx error mapping.
pub(crate) fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}
