//! One-shot streaming viewer transport (server-sent events).

mod stream;

pub use stream::{sse_router, ticket_stream_handler, SseState};
