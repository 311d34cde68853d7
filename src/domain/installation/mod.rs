//! Platform installation aggregate.
//!
//! An Installation records a tenant's connection to exactly one external
//! chat platform: the workspace/guild/group identity plus the bot
//! credentials obtained during the OAuth/deep-link flow. Platforms are
//! mutually exclusive per tenant.

mod installation;
mod platform;

pub use installation::{ChannelConfig, Installation};
pub use platform::Platform;
