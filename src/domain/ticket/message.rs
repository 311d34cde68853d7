//! Canonical messages within a ticket.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{MessageId, TicketId, Timestamp};

/// Where a canonical message originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageSource {
    /// Sent by the visitor through the widget.
    Visitor,
    /// Sent by a tenant agent from the connected chat platform.
    PlatformAgent,
    /// Sent by a tenant agent from the Threadline dashboard.
    DashboardAgent,
    /// Emitted by the system itself (status notices etc.).
    System,
}

impl MessageSource {
    /// Stable kebab-case name used in storage and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSource::Visitor => "visitor",
            MessageSource::PlatformAgent => "platform-agent",
            MessageSource::DashboardAgent => "dashboard-agent",
            MessageSource::System => "system",
        }
    }
}

/// One canonical message, immutable once created.
///
/// Carries the raw external event payload for audit and debugging when the
/// message was mirrored from a platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub ticket_id: TicketId,
    pub source: MessageSource,

    /// Author identity on the originating platform, when applicable.
    pub author_external_id: Option<String>,

    pub text: String,

    /// Platform-scoped event id this message was ingested from, when the
    /// source is a platform. Uniqueness of `(ticket, platform_event_id)`
    /// is enforced through the idempotency ledger, not here.
    pub platform_event_id: Option<String>,

    /// Raw external event payload for audit/debug.
    pub raw: Option<JsonValue>,

    pub created_at: Timestamp,
}

impl Message {
    /// Creates a visitor-authored message.
    pub fn from_visitor(ticket_id: TicketId, text: impl Into<String>) -> Self {
        Self::new(ticket_id, MessageSource::Visitor, text, None, None, None)
    }

    /// Creates a message mirrored from a platform agent reply.
    pub fn from_platform(
        ticket_id: TicketId,
        text: impl Into<String>,
        author_external_id: impl Into<String>,
        platform_event_id: impl Into<String>,
        raw: JsonValue,
    ) -> Self {
        Self::new(
            ticket_id,
            MessageSource::PlatformAgent,
            text,
            Some(author_external_id.into()),
            Some(platform_event_id.into()),
            Some(raw),
        )
    }

    /// Creates a dashboard-agent reply.
    pub fn from_dashboard(ticket_id: TicketId, text: impl Into<String>) -> Self {
        Self::new(ticket_id, MessageSource::DashboardAgent, text, None, None, None)
    }

    /// Creates a system notice.
    pub fn system(ticket_id: TicketId, text: impl Into<String>) -> Self {
        Self::new(ticket_id, MessageSource::System, text, None, None, None)
    }

    fn new(
        ticket_id: TicketId,
        source: MessageSource,
        text: impl Into<String>,
        author_external_id: Option<String>,
        platform_event_id: Option<String>,
        raw: Option<JsonValue>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            ticket_id,
            source,
            author_external_id,
            text: text.into(),
            platform_event_id,
            raw,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&MessageSource::PlatformAgent).unwrap(),
            r#""platform-agent""#
        );
        assert_eq!(MessageSource::DashboardAgent.as_str(), "dashboard-agent");
    }

    #[test]
    fn visitor_message_has_no_platform_fields() {
        let msg = Message::from_visitor(TicketId::new(), "hello");
        assert_eq!(msg.source, MessageSource::Visitor);
        assert!(msg.platform_event_id.is_none());
        assert!(msg.raw.is_none());
    }

    #[test]
    fn platform_message_carries_audit_payload() {
        let raw = json!({"type": "message", "ts": "1.2"});
        let msg = Message::from_platform(TicketId::new(), "on it", "U123", "Ev9", raw.clone());

        assert_eq!(msg.source, MessageSource::PlatformAgent);
        assert_eq!(msg.author_external_id.as_deref(), Some("U123"));
        assert_eq!(msg.platform_event_id.as_deref(), Some("Ev9"));
        assert_eq!(msg.raw, Some(raw));
    }
}
