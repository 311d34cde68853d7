//! Canonical event shape and ingest outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::foundation::{MessageId, Timestamp};
use crate::domain::installation::Platform;

/// Platform-agnostic representation of one inbound chat-platform event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub platform: Platform,

    /// Platform-scoped event identifier, the idempotency handle.
    pub external_event_id: String,

    /// Workspace / guild / supergroup identity.
    pub external_chat_id: String,

    /// Thread timestamp, thread id, or forum topic id, when the event
    /// happened inside a conversation sub-context.
    pub external_thread_ref: Option<String>,

    /// Author identity on the platform.
    pub author_external_id: String,

    /// Whether the platform flagged the author as a bot.
    pub author_is_bot: bool,

    pub text: String,

    pub occurred_at: Timestamp,

    /// The raw native envelope, carried onto the Message row for audit.
    pub raw: JsonValue,
}

/// Why a verified inbound request was rejected.
///
/// Returned as data by `PlatformAdapter::verify`, never thrown: the HTTP
/// edge maps these to 401/400 with no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboundRejection {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("stale timestamp: {age_secs}s outside the replay window")]
    StaleTimestamp { age_secs: i64 },

    #[error("malformed body: {reason}")]
    MalformedBody { reason: String },
}

impl InboundRejection {
    pub fn malformed(reason: impl Into<String>) -> Self {
        InboundRejection::MalformedBody {
            reason: reason.into(),
        }
    }
}

/// Result of running one canonical event through the ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A canonical message was created and `message.created` published.
    Processed { message_id: MessageId },
    /// The event was intentionally not applied.
    Skipped(SkipReason),
}

impl IngestOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, IngestOutcome::Processed { .. })
    }
}

/// Why an event was skipped. All of these are acknowledged with success
/// to the platform to avoid retry storms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The author is the tenant's own installed bot.
    OwnBotMessage,
    /// The idempotency ledger has already seen this event.
    Duplicate,
    /// No ticket is linked to this chat/thread; common for unrelated
    /// channel traffic and never logged as an error.
    NoMatchingTicket,
}

impl SkipReason {
    /// Stable kebab-case name used in logs and acknowledgements.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::OwnBotMessage => "own-bot-message",
            SkipReason::Duplicate => "duplicate",
            SkipReason::NoMatchingTicket => "no-matching-ticket",
        }
    }
}
