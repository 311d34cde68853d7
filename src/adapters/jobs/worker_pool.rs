//! Worker-pool job runtime.
//!
//! N workers drain a bounded mpsc queue fully concurrently; ordering is
//! not guaranteed across jobs. Jobs failing with a storage error are
//! re-enqueued with a fixed short delay up to a bounded attempt count;
//! every other error is terminal for the job (webhook deliveries persist
//! their own retry state and never rely on runtime retry).
//!
//! ## Graceful Shutdown
//!
//! Workers finish their in-flight job after the shutdown signal flips.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::JobsConfig;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{Job, JobExecutor, JobQueue};

/// A job plus its runtime retry count.
#[derive(Debug, Clone)]
struct QueuedJob {
    job: Job,
    attempt: u32,
}

/// Cloneable enqueue handle implementing the `JobQueue` port.
#[derive(Clone)]
pub struct WorkerPoolJobQueue {
    tx: mpsc::Sender<QueuedJob>,
}

#[async_trait]
impl JobQueue for WorkerPoolJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), DomainError> {
        self.tx
            .send(QueuedJob { job, attempt: 0 })
            .await
            .map_err(|_| DomainError::new(ErrorCode::QueueError, "job queue closed"))
    }

    async fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), DomainError> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(QueuedJob { job, attempt: 0 }).await.is_err() {
                tracing::warn!("Job queue closed before delayed job became due");
            }
        });
        Ok(())
    }
}

/// The worker pool itself: owns the workers and the shutdown signal.
pub struct WorkerPool {
    queue: WorkerPoolJobQueue,
    workers: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl WorkerPool {
    /// Start `config.worker_count` workers over the given executor.
    pub fn start(executor: Arc<dyn JobExecutor>, config: &JobsConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shared_rx = Arc::new(Mutex::new(rx));
        let queue = WorkerPoolJobQueue { tx };

        let workers = (0..config.worker_count.max(1))
            .map(|worker_index| {
                tokio::spawn(worker_loop(
                    worker_index,
                    shared_rx.clone(),
                    executor.clone(),
                    queue.clone(),
                    shutdown_rx.clone(),
                    config.ingest_retry_attempts,
                    config.ingest_retry_delay(),
                ))
            })
            .collect();

        Self {
            queue,
            workers,
            shutdown_tx,
        }
    }

    /// The enqueue handle shared with producers.
    pub fn queue(&self) -> WorkerPoolJobQueue {
        self.queue.clone()
    }

    /// Signal shutdown and wait for workers to finish in-flight jobs.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_index: usize,
    rx: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    executor: Arc<dyn JobExecutor>,
    queue: WorkerPoolJobQueue,
    mut shutdown: watch::Receiver<bool>,
    max_retries: u32,
    retry_delay: Duration,
) {
    loop {
        let queued = tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
                continue;
            }
            queued = async {
                let mut rx = rx.lock().await;
                rx.recv().await
            } => queued,
        };

        let Some(queued) = queued else {
            // All senders dropped.
            return;
        };

        let kind = queued.job.kind();
        match executor.execute(queued.job.clone()).await {
            Ok(()) => {}
            Err(e) if e.is_storage() && queued.attempt < max_retries => {
                tracing::warn!(
                    worker = worker_index,
                    job = kind,
                    attempt = queued.attempt + 1,
                    error = %e,
                    "Storage failure, re-enqueueing job"
                );
                let tx = queue.tx.clone();
                let retry = QueuedJob {
                    job: queued.job,
                    attempt: queued.attempt + 1,
                };
                tokio::spawn(async move {
                    tokio::time::sleep(retry_delay).await;
                    let _ = tx.send(retry).await;
                });
            }
            Err(e) => {
                tracing::error!(
                    worker = worker_index,
                    job = kind,
                    attempt = queued.attempt,
                    error = %e,
                    "Job failed terminally"
                );
            }
        }
    }
}
