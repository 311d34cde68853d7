//! Inbound platform hook routes.
//!
//! One entry point per webhook-based platform, accepting the native
//! envelope. Rejections (bad signature/secret, stale timestamp,
//! malformed body) map to 401/400 with no side effects; everything else
//! acknowledges with 200 quickly, even when the event is intentionally
//! skipped, to avoid upstream retry storms. Heavy work happens behind
//! the job queue (or inline in inline mode, which preserves the same
//! outcome).

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::registry::PlatformAdapters;
use crate::domain::installation::Platform;
use crate::domain::pipeline::InboundRejection;
use crate::ports::{InboundRequest, Job, JobQueue, PlatformAdapter};

/// State shared by the hook routes.
#[derive(Clone)]
pub struct HookState {
    pub adapters: PlatformAdapters,
    pub job_queue: Arc<dyn JobQueue>,
}

impl HookState {
    pub fn new(adapters: PlatformAdapters, job_queue: Arc<dyn JobQueue>) -> Self {
        Self { adapters, job_queue }
    }
}

/// `POST /hooks/slack` — Slack Events API entry point.
pub async fn slack_hook(
    State(state): State<HookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = inbound_request(&headers, &body);

    let adapter = match state.adapters.for_platform(Platform::Slack) {
        Ok(adapter) => adapter,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let authenticated = match adapter.verify(&request) {
        Ok(event) => event,
        Err(rejection) => return rejection_response(Platform::Slack, rejection),
    };

    // The Events API handshake echoes the challenge back verbatim.
    if let Some(challenge) = authenticated
        .payload
        .get("challenge")
        .and_then(|c| c.as_str())
    {
        return (StatusCode::OK, challenge.to_string()).into_response();
    }

    match adapter.normalize(&authenticated) {
        Some(canonical) => enqueue(&state, canonical).await,
        None => acknowledged("ignored"),
    }
}

/// `POST /hooks/discord` — Discord relay entry point.
pub async fn discord_hook(
    State(state): State<HookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = inbound_request(&headers, &body);

    let adapter = match state.adapters.for_platform(Platform::Discord) {
        Ok(adapter) => adapter,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let authenticated = match adapter.verify(&request) {
        Ok(event) => event,
        Err(rejection) => return rejection_response(Platform::Discord, rejection),
    };

    match adapter.normalize(&authenticated) {
        Some(canonical) => enqueue(&state, canonical).await,
        None => acknowledged("ignored"),
    }
}

fn inbound_request(headers: &HeaderMap, body: &Bytes) -> InboundRequest {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();
    InboundRequest::new(headers, body.to_vec())
}

fn rejection_response(platform: Platform, rejection: InboundRejection) -> Response {
    tracing::warn!(platform = %platform, rejection = %rejection, "Rejected inbound request");
    let status = match rejection {
        InboundRejection::InvalidSignature | InboundRejection::StaleTimestamp { .. } => {
            StatusCode::UNAUTHORIZED
        }
        InboundRejection::MalformedBody { .. } => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({"error": rejection.to_string()}))).into_response()
}

async fn enqueue(state: &HookState, canonical: crate::domain::pipeline::CanonicalEvent) -> Response {
    match state
        .job_queue
        .enqueue(Job::IngestPlatformEvent(canonical))
        .await
    {
        Ok(()) => acknowledged("queued"),
        Err(e) => {
            // Storage failures are the one class worth a non-200: the
            // platform's own retry will redeliver and the ledger keeps
            // that safe.
            tracing::error!(error = %e, "Failed to schedule inbound event");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn acknowledged(disposition: &str) -> Response {
    (StatusCode::OK, Json(json!({"ok": true, "disposition": disposition}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlatformsConfig, SlackConfig};
    use crate::domain::foundation::DomainError;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct RecordingQueue {
        jobs: Mutex<Vec<Job>>,
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn enqueue(&self, job: Job) -> Result<(), DomainError> {
            self.jobs.lock().await.push(job);
            Ok(())
        }

        async fn enqueue_after(&self, job: Job, _delay: Duration) -> Result<(), DomainError> {
            self.jobs.lock().await.push(job);
            Ok(())
        }
    }

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    fn state() -> (HookState, Arc<RecordingQueue>) {
        let adapters = PlatformAdapters::from_config(&PlatformsConfig {
            slack: Some(SlackConfig {
                signing_secret: SecretString::new(SECRET.to_string()),
                api_base_url: "https://slack.invalid/api".to_string(),
            }),
            discord: None,
            telegram: None,
        });
        let queue = Arc::new(RecordingQueue {
            jobs: Mutex::new(Vec::new()),
        });
        (HookState::new(adapters, queue.clone()), queue)
    }

    fn signed_headers(body: &str) -> HeaderMap {
        use crate::adapters::slack::signature::sign_slack;
        let now = crate::domain::foundation::Timestamp::now().as_unix_secs();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-slack-signature",
            HeaderValue::from_str(&sign_slack(SECRET, now, body.as_bytes())).unwrap(),
        );
        headers.insert(
            "x-slack-request-timestamp",
            HeaderValue::from_str(&now.to_string()).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn unsigned_request_is_unauthorized() {
        let (state, queue) = state();
        let response = slack_hook(
            State(state),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(queue.jobs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn challenge_is_echoed_back() {
        let (state, _queue) = state();
        let body = r#"{"type":"url_verification","challenge":"ch4ll"}"#;
        let response = slack_hook(
            State(state),
            signed_headers(body),
            Bytes::from(body.to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"ch4ll");
    }

    #[tokio::test]
    async fn message_event_is_queued_and_acknowledged() {
        let (state, queue) = state();
        let body = serde_json::json!({
            "type": "event_callback",
            "team_id": "T1",
            "event_id": "Ev1",
            "event": {
                "type": "message",
                "channel": "C1",
                "user": "U1",
                "text": "hi",
                "ts": "1700000000.000100",
                "thread_ts": "1700000000.000001"
            }
        })
        .to_string();

        let response = slack_hook(
            State(state),
            signed_headers(&body),
            Bytes::from(body.clone()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(queue.jobs.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn ignored_event_still_returns_ok() {
        let (state, queue) = state();
        let body = serde_json::json!({
            "type": "event_callback",
            "team_id": "T1",
            "event_id": "Ev2",
            "event": {"type": "reaction_added", "ts": "1.1"}
        })
        .to_string();

        let response = slack_hook(
            State(state),
            signed_headers(&body),
            Bytes::from(body.clone()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(queue.jobs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_platform_is_not_found() {
        let (state, _queue) = state();
        let response = discord_hook(
            State(state),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
