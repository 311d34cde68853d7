//! Viewer protocol frames.
//!
//! Wire contract (also mirrored by the SSE transport's named events):
//! `{"type":"connected","ticketId":...}`, `{"type":"message","data":...}`,
//! `{"type":"ping"}` / `{"type":"pong"}`.

use serde::{Deserialize, Serialize};

use crate::adapters::events::TicketMessagePayload;

/// Frames sent from server to viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Connection established and tagged with a ticket.
    Connected {
        #[serde(rename = "ticketId")]
        ticket_id: String,
    },

    /// A new canonical message on the ticket.
    Message { data: TicketMessagePayload },

    /// Heartbeat reply.
    Pong,
}

/// Frames received from the viewer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Heartbeat request; server answers with `pong`.
    Ping,
}
