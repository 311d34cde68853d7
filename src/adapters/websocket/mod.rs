//! Long-lived viewer transport: one WebSocket per dashboard viewer,
//! tagged with a single ticket at connect time.

mod handler;
mod messages;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::{ClientFrame, ServerFrame};
