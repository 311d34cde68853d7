//! WebSocket upgrade handler for live ticket viewers.
//!
//! Lifecycle:
//! 1. Parse the ticket id from the path (unparseable -> 400 before upgrade)
//! 2. Upgrade and subscribe to the ticket's feed topic
//! 3. Send the `connected` frame
//! 4. Forward feed payloads and answer pings until disconnect
//! 5. Drop the subscription, releasing the topic refcount

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};

use crate::adapters::events::TicketFeed;
use crate::domain::foundation::TicketId;

use super::messages::{ClientFrame, ServerFrame};

/// State required by the WebSocket transport.
#[derive(Clone)]
pub struct WebSocketState {
    pub feed: TicketFeed,
}

impl WebSocketState {
    pub fn new(feed: TicketFeed) -> Self {
        Self { feed }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /tickets/:ticket_id/live`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(ticket_id): Path<String>,
    State(state): State<WebSocketState>,
) -> Response {
    // A connection must be tagged with a ticket before upgrading.
    let ticket_id: TicketId = match ticket_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, "invalid ticket id").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, ticket_id, state))
}

/// Drive one established viewer connection until either side closes.
async fn handle_socket(socket: WebSocket, ticket_id: TicketId, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.feed.subscribe(ticket_id);

    let connected = ServerFrame::Connected {
        ticket_id: ticket_id.to_string(),
    };
    if send_frame(&mut sender, &connected).await.is_err() {
        // Client disconnected immediately; the subscription drop below
        // releases the topic.
        return;
    }

    loop {
        tokio::select! {
            payload = subscription.recv() => {
                match payload {
                    Some(data) => {
                        // Best-effort broadcast: an unwritable viewer
                        // closes its own connection, nothing else.
                        if send_frame(&mut sender, &ServerFrame::Message { data }).await.is_err() {
                            tracing::debug!(ticket_id = %ticket_id, "Viewer unwritable, closing");
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientFrame::Ping) = serde_json::from_str::<ClientFrame>(&text) {
                            if send_frame(&mut sender, &ServerFrame::Pong).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(ticket_id = %ticket_id, "Viewer disconnected");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and protocol ping/pong frames are ignored.
                    }
                    Some(Err(e)) => {
                        tracing::debug!(ticket_id = %ticket_id, error = %e, "Viewer receive error");
                        break;
                    }
                }
            }
        }
    }

    // Subscription drops here, releasing the per-ticket topic.
}

async fn send_frame(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    frame: &ServerFrame,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame)
        .expect("ServerFrame serialization should not fail");
    sender.send(Message::Text(json)).await
}

/// Router for the WebSocket endpoint.
pub fn websocket_router() -> Router<WebSocketState> {
    Router::new().route("/tickets/:ticket_id/live", get(ws_handler))
}
