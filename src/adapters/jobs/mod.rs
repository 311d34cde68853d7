//! Job runtime adapters.
//!
//! Two interchangeable execution modes over one [`JobExecutor`]: a
//! long-lived worker pool draining an in-process queue, and an inline
//! runner executing jobs within the enqueueing call for deployments that
//! cannot host background workers. Outcome parity is by construction:
//! queue adapters decide *when* a job runs, never *what* it does.

mod inline;
mod worker_pool;

pub use inline::InlineJobQueue;
pub use worker_pool::{WorkerPool, WorkerPoolJobQueue};
