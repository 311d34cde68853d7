//! Top-level router composition.

use axum::{routing::get, routing::post, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::sse::{sse_router, SseState};
use crate::adapters::websocket::{websocket_router, WebSocketState};

use super::hooks::{discord_hook, slack_hook, HookState};

/// Build the full HTTP surface: hook entry points, live viewer
/// transports, and health.
///
/// CORS is permissive: the widget and dashboard are embedded on tenant
/// sites, so live routes must be reachable cross-origin; authenticity
/// of hook traffic is established by signatures, not origins.
pub fn build_router(
    hook_state: HookState,
    ws_state: WebSocketState,
    sse_state: SseState,
) -> Router {
    let hooks = Router::new()
        .route("/hooks/slack", post(slack_hook))
        .route("/hooks/discord", post(discord_hook))
        .with_state(hook_state);

    Router::new()
        .route("/health", get(health))
        .merge(hooks)
        .merge(websocket_router().with_state(ws_state))
        .merge(sse_router().with_state(sse_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
