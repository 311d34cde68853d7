//! Ports: interfaces the application core depends on.
//!
//! Adapters implement these traits; the application layer only ever sees
//! the trait objects. Every port is object-safe and `Send + Sync`.

mod event_publisher;
mod event_subscriber;
mod idempotency_ledger;
mod installation_repository;
mod job_queue;
mod message_repository;
mod platform_adapter;
mod ticket_repository;
mod webhook_delivery_repository;
mod webhook_endpoint_repository;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventHandler, EventSubscriber};
pub use idempotency_ledger::{IdempotencyLedger, LedgerDecision};
pub use installation_repository::InstallationRepository;
pub use job_queue::{Job, JobExecutor, JobQueue};
pub use message_repository::MessageRepository;
pub use platform_adapter::{
    AuthenticatedEvent, ExternalMessageRef, ExternalThreadRef, InboundRequest, PlatformAdapter,
};
pub use ticket_repository::TicketRepository;
pub use webhook_delivery_repository::WebhookDeliveryRepository;
pub use webhook_endpoint_repository::WebhookEndpointRepository;
