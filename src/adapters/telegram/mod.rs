//! Telegram platform adapter.
//!
//! Structurally different from the webhook-based platforms: Telegram
//! events arrive over a long-lived `getUpdates` long-poll connection held
//! by [`TelegramConnector`], not as discrete signed webhook calls. The
//! connector converts pushed updates into the same canonical shape and
//! feeds them through the job queue, so the rest of the pipeline never
//! sees the difference.
//!
//! Outbound: `sendMessage` (with `message_thread_id` for forum topics)
//! and `createForumTopic`.

mod adapter;
mod connector;
mod types;

pub use adapter::TelegramAdapter;
pub use connector::TelegramConnector;
