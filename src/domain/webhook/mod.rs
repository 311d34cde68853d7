//! Outbound webhook aggregate: tenant endpoints and delivery records.

mod delivery;
mod endpoint;
mod policy;

pub use delivery::{DeliveryDisposition, DeliveryStatus, WebhookDelivery};
pub use endpoint::WebhookEndpoint;
pub use policy::DeliveryPolicy;
