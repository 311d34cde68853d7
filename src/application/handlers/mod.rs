//! Command handlers: one per pipeline operation.

mod attempt_delivery;
mod dispatch_webhooks;
mod ingest_platform_event;
mod open_ticket_thread;
mod post_agent_reply;
mod update_ticket_status;

pub use attempt_delivery::AttemptDeliveryHandler;
pub use dispatch_webhooks::{WebhookDispatchHandler, WEBHOOK_EVENT_TYPES};
pub use ingest_platform_event::IngestPlatformEventHandler;
pub use open_ticket_thread::{OpenTicketThreadHandler, OpenTicketThreadCommand, OpenTicketThreadResult};
pub use post_agent_reply::{PostAgentReplyHandler, PostAgentReplyCommand};
pub use update_ticket_status::{UpdateTicketStatusHandler, UpdateTicketStatusCommand};
