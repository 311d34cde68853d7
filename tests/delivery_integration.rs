//! Webhook delivery engine tests against a real local HTTP receiver.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Router};
use serde_json::json;

use threadline::adapters::delivery::verify_payload;
use threadline::app::{App, Stores};
use threadline::config::{AppConfig, DatabaseConfig, JobMode, JobsConfig, WebhooksConfig};
use threadline::domain::foundation::{TenantId, Timestamp};
use threadline::domain::webhook::{DeliveryStatus, WebhookDelivery, WebhookEndpoint};
use threadline::ports::{Job, JobQueue, WebhookDeliveryRepository, WebhookEndpointRepository};

/// A receiver that fails with 500 until `succeed_after` requests have
/// been seen, then returns 200. Captures headers and bodies.
#[derive(Clone)]
struct Receiver {
    hits: Arc<AtomicU32>,
    succeed_after: u32,
    seen: Arc<Mutex<Vec<(HeaderMap, String)>>>,
}

async fn receive(State(receiver): State<Receiver>, headers: HeaderMap, body: String) -> StatusCode {
    let hit = receiver.hits.fetch_add(1, Ordering::SeqCst) + 1;
    receiver.seen.lock().unwrap().push((headers, body));
    if hit <= receiver.succeed_after {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn spawn_receiver(succeed_after: u32) -> (SocketAddr, Receiver) {
    let receiver = Receiver {
        hits: Arc::new(AtomicU32::new(0)),
        succeed_after,
        seen: Arc::new(Mutex::new(Vec::new())),
    };

    let router = Router::new()
        .route("/hook", post(receive))
        .with_state(receiver.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, receiver)
}

fn fast_retry_config() -> AppConfig {
    AppConfig {
        server: Default::default(),
        database: DatabaseConfig {
            url: "postgresql://localhost/unused".to_string(),
            ..Default::default()
        },
        platforms: Default::default(),
        webhooks: WebhooksConfig {
            max_attempts: 5,
            base_delay_ms: 10,
            max_delay_ms: 50,
            timeout_secs: 2,
            signature_tolerance_secs: 300,
        },
        jobs: JobsConfig {
            mode: JobMode::Inline,
            ..Default::default()
        },
    }
}

async fn seeded_delivery(stores: &Stores, url: &str) -> (WebhookEndpoint, WebhookDelivery) {
    let endpoint = WebhookEndpoint::register(TenantId::from_string("acct-1"), url).unwrap();
    stores.endpoints.save(&endpoint).await.unwrap();

    let delivery = WebhookDelivery::pending(
        endpoint.id,
        "message.created",
        "msg-1",
        json!({
            "event": "message.created",
            "timestamp": Timestamp::now().to_rfc3339(),
            "data": {"ticketId": "t-1", "accountId": "acct-1", "text": "hello"},
        }),
    );
    stores.deliveries.insert(&delivery).await.unwrap();
    (endpoint, delivery)
}

async fn wait_terminal(stores: &Stores, delivery: &WebhookDelivery) -> WebhookDelivery {
    for _ in 0..100 {
        let current = stores
            .deliveries
            .find_by_id(&delivery.id)
            .await
            .unwrap()
            .unwrap();
        if current.is_terminal() {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("delivery never reached a terminal state");
}

#[tokio::test]
async fn four_failures_then_success_ends_with_five_attempts() {
    let (addr, receiver) = spawn_receiver(4).await;
    let stores = Stores::in_memory();
    let app = App::assemble(&fast_retry_config(), stores.clone());

    let (endpoint, delivery) = seeded_delivery(&stores, &format!("http://{}/hook", addr)).await;

    app.handlers
        .job_queue
        .enqueue(Job::DeliverWebhook {
            delivery_id: delivery.id,
        })
        .await
        .unwrap();

    let done = wait_terminal(&stores, &delivery).await;
    assert_eq!(done.status, DeliveryStatus::Success);
    assert_eq!(done.attempt_count, 5);
    assert_eq!(done.last_status, Some(200));
    assert_eq!(receiver.hits.load(Ordering::SeqCst), 5);

    // Every request carried a verifiable signature over the exact body.
    let seen = receiver.seen.lock().unwrap();
    for (headers, body) in seen.iter() {
        let signature = headers
            .get("x-webhook-signature")
            .and_then(|v| v.to_str().ok())
            .expect("missing signature header");
        let now = Timestamp::now().as_unix_secs();
        verify_payload(&endpoint.secret, signature, body, now, 300)
            .expect("signature did not verify");

        assert!(headers.contains_key("x-webhook-timestamp"));
        assert_eq!(
            headers
                .get("x-webhook-id")
                .and_then(|v| v.to_str().ok())
                .unwrap(),
            delivery.id.to_string()
        );
    }
}

#[tokio::test]
async fn permanent_failure_is_terminal_after_exactly_max_attempts() {
    let (addr, receiver) = spawn_receiver(u32::MAX).await;
    let stores = Stores::in_memory();
    let app = App::assemble(&fast_retry_config(), stores.clone());

    let (_endpoint, delivery) = seeded_delivery(&stores, &format!("http://{}/hook", addr)).await;

    app.handlers
        .job_queue
        .enqueue(Job::DeliverWebhook {
            delivery_id: delivery.id,
        })
        .await
        .unwrap();

    let done = wait_terminal(&stores, &delivery).await;
    assert_eq!(done.status, DeliveryStatus::Failed);
    assert_eq!(done.attempt_count, 5);
    assert_eq!(done.last_status, Some(500));
    assert!(done.last_error.is_some());

    // No further attempts happen after the terminal state.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(receiver.hits.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn tampered_body_fails_receiver_side_verification() {
    let (addr, receiver) = spawn_receiver(0).await;
    let stores = Stores::in_memory();
    let app = App::assemble(&fast_retry_config(), stores.clone());

    let (endpoint, delivery) = seeded_delivery(&stores, &format!("http://{}/hook", addr)).await;

    app.handlers
        .job_queue
        .enqueue(Job::DeliverWebhook {
            delivery_id: delivery.id,
        })
        .await
        .unwrap();

    wait_terminal(&stores, &delivery).await;

    let seen = receiver.seen.lock().unwrap();
    let (headers, body) = &seen[0];
    let signature = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    let now = Timestamp::now().as_unix_secs();

    let mut tampered = body.clone();
    tampered.push(' ');
    assert!(verify_payload(&endpoint.secret, signature, &tampered, now, 300).is_err());
    assert!(verify_payload("whsec_wrong", signature, body, now, 300).is_err());
}
