//! SSE stream handler for live ticket viewers.
//!
//! Each request wraps its own feed subscription in the response stream:
//! when the client disconnects and the response body is dropped, the
//! subscription guard drops with it, synchronously releasing the broker
//! topic and stopping the heartbeat. No per-ticket subscription outlives
//! its request.
//!
//! Wire format: named events `connected` and `message`, plus
//! comment-style keep-alive frames every 30 seconds so intermediaries do
//! not idle the connection out.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::stream::{self, Stream, StreamExt};

use crate::adapters::events::{TicketFeed, TicketSubscription};
use crate::domain::foundation::TicketId;

/// Heartbeat interval for comment frames.
const HEARTBEAT: Duration = Duration::from_secs(30);

/// State required by the SSE transport.
#[derive(Clone)]
pub struct SseState {
    pub feed: TicketFeed,
}

impl SseState {
    pub fn new(feed: TicketFeed) -> Self {
        Self { feed }
    }
}

/// Handle an SSE stream request.
///
/// Route: `GET /tickets/:ticket_id/stream`
pub async fn ticket_stream_handler(
    Path(ticket_id): Path<String>,
    State(state): State<SseState>,
) -> Response {
    let ticket_id: TicketId = match ticket_id.parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "invalid ticket id").into_response(),
    };

    let subscription = state.feed.subscribe(ticket_id);

    Sse::new(ticket_event_stream(ticket_id, subscription))
        .keep_alive(KeepAlive::new().interval(HEARTBEAT))
        .into_response()
}

/// The event stream: one `connected` event, then a `message` event per
/// fan-out payload. Owns the subscription so stream drop releases it.
fn ticket_event_stream(
    ticket_id: TicketId,
    subscription: TicketSubscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let connected = Event::default()
        .event("connected")
        .data(format!(r#"{{"ticketId":"{}"}}"#, ticket_id));

    let messages = stream::unfold(subscription, |mut subscription| async move {
        let payload = subscription.recv().await?;
        let event = match Event::default().event("message").json_data(&payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize stream payload");
                return None;
            }
        };
        Some((Ok(event), subscription))
    });

    stream::once(async move { Ok(connected) }).chain(messages)
}

/// Router for the SSE endpoint.
pub fn sse_router() -> Router<SseState> {
    Router::new().route("/tickets/:ticket_id/stream", get(ticket_stream_handler))
}
