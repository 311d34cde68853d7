//! Discord platform adapter.
//!
//! Inbound: relay payloads authenticated by a static shared secret
//! header. Outbound: Discord REST (`/channels/{id}/messages`,
//! `/channels/{id}/threads`); a Discord thread is itself a channel, so
//! posting into a thread posts to the thread's channel id.

mod adapter;
mod types;

pub use adapter::DiscordAdapter;
pub use types::DiscordRelayEvent;
