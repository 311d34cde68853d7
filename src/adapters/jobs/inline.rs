//! Inline job runtime.
//!
//! Executes jobs synchronously within the enqueueing call, for
//! deployments that cannot host background workers. Semantics match the
//! worker pool: the same executor runs, and storage failures retry up to
//! the same bounded count. The idempotency ledger makes the substitution
//! safe: an event processed inline and then redelivered by the platform
//! is still detected as a duplicate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::JobsConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{Job, JobExecutor, JobQueue};

/// Inline execution of the `JobQueue` port.
pub struct InlineJobQueue {
    executor: Arc<dyn JobExecutor>,
    max_retries: u32,
    retry_delay: Duration,
}

impl InlineJobQueue {
    pub fn new(executor: Arc<dyn JobExecutor>, config: &JobsConfig) -> Self {
        Self {
            executor,
            max_retries: config.ingest_retry_attempts,
            retry_delay: config.ingest_retry_delay(),
        }
    }

    async fn run_with_retries(&self, job: Job) -> Result<(), DomainError> {
        let mut attempt = 0u32;
        loop {
            match self.executor.execute(job.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_storage() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        job = job.kind(),
                        attempt,
                        error = %e,
                        "Storage failure, retrying inline"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl JobQueue for InlineJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), DomainError> {
        self.run_with_retries(job).await
    }

    async fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), DomainError> {
        // Delayed work cannot block the inbound request; it runs on a
        // timer task in this process.
        let executor = self.executor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = executor.execute(job.clone()).await {
                tracing::error!(job = job.kind(), error = %e, "Delayed inline job failed");
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DeliveryId;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingExecutor {
        executions: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl JobExecutor for CountingExecutor {
        async fn execute(&self, _job: Job) -> Result<(), DomainError> {
            let n = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                Err(DomainError::database("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    fn queue(fail_first: u32) -> (InlineJobQueue, Arc<CountingExecutor>) {
        let executor = Arc::new(CountingExecutor {
            executions: AtomicU32::new(0),
            fail_first,
        });
        let config = JobsConfig {
            ingest_retry_attempts: 3,
            ingest_retry_delay_ms: 5,
            ..Default::default()
        };
        (InlineJobQueue::new(executor.clone(), &config), executor)
    }

    fn job() -> Job {
        Job::DeliverWebhook {
            delivery_id: DeliveryId::new(),
        }
    }

    #[tokio::test]
    async fn enqueue_executes_before_returning() {
        let (queue, executor) = queue(0);
        queue.enqueue(job()).await.unwrap();
        assert_eq!(executor.executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn storage_failures_retry_inline() {
        let (queue, executor) = queue(2);
        queue.enqueue(job()).await.unwrap();
        assert_eq!(executor.executions.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_error() {
        let (queue, executor) = queue(u32::MAX);
        let result = queue.enqueue(job()).await;
        assert!(result.is_err());
        assert_eq!(executor.executions.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn enqueue_after_runs_on_a_timer() {
        let (queue, executor) = queue(0);
        queue
            .enqueue_after(job(), Duration::from_millis(20))
            .await
            .unwrap();

        assert_eq!(executor.executions.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(executor.executions.load(Ordering::SeqCst), 1);
    }
}
