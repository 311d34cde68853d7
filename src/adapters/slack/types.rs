//! Serde views of the Slack Events API envelopes we consume.

use serde::{Deserialize, Serialize};

/// Top-level Events API envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackEnvelope {
    /// "url_verification" | "event_callback"
    #[serde(rename = "type")]
    pub envelope_type: String,

    /// Workspace the event happened in.
    pub team_id: Option<String>,

    /// Slack-assigned event id ("Ev..."), the idempotency handle.
    pub event_id: Option<String>,

    /// Challenge string for `url_verification` handshakes.
    pub challenge: Option<String>,

    /// The inner event for `event_callback` envelopes.
    pub event: Option<SlackInnerEvent>,
}

/// The inner event we care about: channel messages.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackInnerEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    /// Message subtype ("bot_message", "message_changed", ...).
    pub subtype: Option<String>,

    pub channel: Option<String>,

    /// Human author, absent for some bot messages.
    pub user: Option<String>,

    /// Present when a bot authored the message.
    pub bot_id: Option<String>,

    pub text: Option<String>,

    /// Message timestamp; also the thread handle for root messages.
    pub ts: Option<String>,

    /// Present when the message is a reply inside a thread.
    pub thread_ts: Option<String>,
}

/// Response body of `chat.postMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackPostMessageResponse {
    pub ok: bool,
    pub ts: Option<String>,
    pub error: Option<String>,
}

/// Request body of `chat.postMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SlackPostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<&'a str>,
}
