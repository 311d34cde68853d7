//! Foundation value objects shared across the domain.
//!
//! Strongly-typed identifiers, timestamps, the domain error taxonomy, and
//! the event envelope infrastructure every aggregate builds on.

mod errors;
mod events;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent};
pub use ids::{
    ChannelConfigId, DeliveryId, EndpointId, InstallationId, MessageId, TenantId, TicketId,
    VisitorId,
};
pub use timestamp::Timestamp;
