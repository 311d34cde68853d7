//! Long-lived Telegram update connector.
//!
//! Holds the outbound `getUpdates` long-poll connection, converts pushed
//! updates into canonical events, and schedules them on the job queue so
//! they flow through the exact same ingest path as webhook traffic.
//!
//! ## Graceful Shutdown
//!
//! The connector listens on a watch channel and finishes the in-flight
//! poll before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::installation::Platform;
use crate::ports::{AuthenticatedEvent, Job, JobQueue, PlatformAdapter};

use super::TelegramAdapter;

/// Pause after a failed poll before reconnecting.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Background service draining the Telegram update stream.
pub struct TelegramConnector {
    adapter: Arc<TelegramAdapter>,
    job_queue: Arc<dyn JobQueue>,
}

impl TelegramConnector {
    pub fn new(adapter: Arc<TelegramAdapter>, job_queue: Arc<dyn JobQueue>) -> Self {
        Self { adapter, job_queue }
    }

    /// Run the poll loop until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut offset: i64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Telegram connector stopping");
                        return;
                    }
                }

                result = self.adapter.get_updates(offset) => {
                    match result {
                        Ok(updates) => {
                            for update in updates {
                                if let Some(update_id) =
                                    update.get("update_id").and_then(|v| v.as_i64())
                                {
                                    offset = offset.max(update_id + 1);
                                }
                                self.schedule(update).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Telegram poll failed, backing off");
                            tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }
    }

    /// Normalize one update and enqueue it for ingestion.
    async fn schedule(&self, update: serde_json::Value) {
        let authenticated = AuthenticatedEvent {
            platform: Platform::Telegram,
            payload: update,
        };

        let Some(canonical) = self.adapter.normalize(&authenticated) else {
            // Non-message updates and private chats are not ticket traffic.
            return;
        };

        if let Err(e) = self
            .job_queue
            .enqueue(Job::IngestPlatformEvent(canonical))
            .await
        {
            tracing::error!(error = %e, "Failed to enqueue Telegram event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;
    use crate::domain::foundation::DomainError;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;
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

    fn connector() -> (TelegramConnector, Arc<RecordingQueue>) {
        let adapter = Arc::new(TelegramAdapter::new(TelegramConfig {
            bot_token: SecretString::new("123456:TESTTOKEN".to_string()),
            api_base_url: "https://telegram.invalid".to_string(),
            poll_timeout_secs: 1,
        }));
        let queue = Arc::new(RecordingQueue {
            jobs: Mutex::new(Vec::new()),
        });
        (TelegramConnector::new(adapter, queue.clone()), queue)
    }

    #[tokio::test]
    async fn schedule_enqueues_group_messages() {
        let (connector, queue) = connector();

        connector
            .schedule(json!({
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "chat": {"id": -100500, "type": "supergroup"},
                    "message_thread_id": 7,
                    "from": {"id": 9, "is_bot": false},
                    "text": "hello",
                    "date": 1700000000
                }
            }))
            .await;

        let jobs = queue.jobs.lock().await;
        assert_eq!(jobs.len(), 1);
        match &jobs[0] {
            Job::IngestPlatformEvent(event) => {
                assert_eq!(event.external_event_id, "10");
                assert_eq!(event.external_thread_ref.as_deref(), Some("7"));
            }
            other => panic!("unexpected job: {:?}", other),
        }
    }

    #[tokio::test]
    async fn schedule_drops_non_message_updates() {
        let (connector, queue) = connector();
        connector.schedule(json!({"update_id": 11})).await;
        assert!(queue.jobs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let (connector, _queue) = connector();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { connector.run(rx).await });

        // The poll target is unreachable, so the loop will be inside the
        // error backoff; the shutdown signal must still win.
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("connector did not stop")
            .unwrap();
    }
}
