//! Serde views of the Discord relay payloads and REST responses.

use serde::{Deserialize, Serialize};

/// Relay payload for a guild message event.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordRelayEvent {
    /// "MESSAGE_CREATE" is the only event the pipeline consumes.
    pub event: String,

    /// Message id; the idempotency handle.
    pub id: String,

    pub guild_id: Option<String>,

    /// Channel the message was posted in.
    pub channel_id: String,

    /// Present when the channel is a thread.
    pub thread_id: Option<String>,

    pub author: DiscordAuthor,

    #[serde(default)]
    pub content: String,

    /// RFC 3339 creation time.
    pub timestamp: Option<String>,
}

/// Message author identity.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordAuthor {
    pub id: String,
    #[serde(default)]
    pub bot: bool,
}

/// Response of `POST /channels/{id}/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessageResponse {
    pub id: String,
}

/// Response of `POST /channels/{id}/threads`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordThreadResponse {
    pub id: String,
}

/// Request body of `POST /channels/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct DiscordMessageRequest<'a> {
    pub content: &'a str,
}

/// Request body of `POST /channels/{id}/threads`.
///
/// `kind` 11 is a public thread.
#[derive(Debug, Clone, Serialize)]
pub struct DiscordThreadRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thread_message() {
        let json = r#"{
            "event": "MESSAGE_CREATE",
            "id": "1112223334445556",
            "guild_id": "999888777",
            "channel_id": "123123123",
            "thread_id": "456456456",
            "author": {"id": "42", "bot": false},
            "content": "checking now",
            "timestamp": "2026-01-10T12:00:00Z"
        }"#;

        let event: DiscordRelayEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.thread_id.as_deref(), Some("456456456"));
        assert!(!event.author.bot);
    }

    #[test]
    fn author_bot_defaults_false() {
        let json = r#"{
            "event": "MESSAGE_CREATE",
            "id": "1",
            "channel_id": "2",
            "author": {"id": "3"}
        }"#;
        let event: DiscordRelayEvent = serde_json::from_str(json).unwrap();
        assert!(!event.author.bot);
        assert!(event.content.is_empty());
    }

    #[test]
    fn thread_request_serializes_type_field() {
        let request = DiscordThreadRequest {
            name: "Ticket: broken cart",
            kind: 11,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""type":11"#));
    }
}
