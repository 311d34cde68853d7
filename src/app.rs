//! Composition root.
//!
//! All process-wide resources (datastore pool, event bus, viewer feed,
//! platform adapters, job runtime) are constructed once here and handed
//! down as explicit dependencies; nothing lives in module-level globals
//! and teardown is explicit through the shutdown signal.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::adapters::events::{LocalEventBus, TicketFeed, TicketFeedBridge};
use crate::adapters::http::{build_router, HookState};
use crate::adapters::jobs::{InlineJobQueue, WorkerPool};
use crate::adapters::memory::{
    InMemoryIdempotencyLedger, InMemoryInstallationRepository, InMemoryMessageRepository,
    InMemoryTicketRepository, InMemoryWebhookDeliveryRepository,
    InMemoryWebhookEndpointRepository,
};
use crate::adapters::postgres::{
    PostgresIdempotencyLedger, PostgresInstallationRepository, PostgresMessageRepository,
    PostgresTicketRepository, PostgresWebhookDeliveryRepository,
    PostgresWebhookEndpointRepository,
};
use crate::adapters::registry::PlatformAdapters;
use crate::adapters::sse::SseState;
use crate::adapters::telegram::TelegramConnector;
use crate::adapters::websocket::WebSocketState;
use crate::application::handlers::{
    AttemptDeliveryHandler, IngestPlatformEventHandler, OpenTicketThreadHandler,
    PostAgentReplyHandler, UpdateTicketStatusHandler, WebhookDispatchHandler,
};
use crate::application::{PipelineJobExecutor, ThreadResolver};
use crate::config::{AppConfig, JobMode};
use crate::domain::webhook::DeliveryPolicy;
use crate::ports::{
    EventPublisher, IdempotencyLedger, InstallationRepository, JobQueue, MessageRepository,
    TicketRepository, WebhookDeliveryRepository, WebhookEndpointRepository,
};

/// The persistence ports the pipeline runs on.
#[derive(Clone)]
pub struct Stores {
    pub tickets: Arc<dyn TicketRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub installations: Arc<dyn InstallationRepository>,
    pub ledger: Arc<dyn IdempotencyLedger>,
    pub endpoints: Arc<dyn WebhookEndpointRepository>,
    pub deliveries: Arc<dyn WebhookDeliveryRepository>,
}

impl Stores {
    /// Production stores over a PostgreSQL pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            tickets: Arc::new(PostgresTicketRepository::new(pool.clone())),
            messages: Arc::new(PostgresMessageRepository::new(pool.clone())),
            installations: Arc::new(PostgresInstallationRepository::new(pool.clone())),
            ledger: Arc::new(PostgresIdempotencyLedger::new(pool.clone())),
            endpoints: Arc::new(PostgresWebhookEndpointRepository::new(pool.clone())),
            deliveries: Arc::new(PostgresWebhookDeliveryRepository::new(pool)),
        }
    }

    /// In-memory stores for tests and local development.
    pub fn in_memory() -> Self {
        Self {
            tickets: Arc::new(InMemoryTicketRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            installations: Arc::new(InMemoryInstallationRepository::new()),
            ledger: Arc::new(InMemoryIdempotencyLedger::new()),
            endpoints: Arc::new(InMemoryWebhookEndpointRepository::new()),
            deliveries: Arc::new(InMemoryWebhookDeliveryRepository::new()),
        }
    }
}

/// The assembled application.
pub struct App {
    pub router: Router,
    pub handlers: Handlers,
    pub feed: TicketFeed,
    worker_pool: Option<WorkerPool>,
    telegram_task: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

/// Command handlers exposed to route glue and tests.
#[derive(Clone)]
pub struct Handlers {
    pub open_ticket: Arc<OpenTicketThreadHandler>,
    pub post_reply: Arc<PostAgentReplyHandler>,
    pub update_status: Arc<UpdateTicketStatusHandler>,
    pub job_queue: Arc<dyn JobQueue>,
}

impl App {
    /// Wire the full dependency graph.
    pub fn assemble(config: &AppConfig, stores: Stores) -> Self {
        let adapters = PlatformAdapters::from_config(&config.platforms);
        let bus = Arc::new(LocalEventBus::new());
        let feed = TicketFeed::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Ingest path.
        let resolver = Arc::new(ThreadResolver::new(
            stores.installations.clone(),
            stores.tickets.clone(),
        ));
        let ingest = Arc::new(IngestPlatformEventHandler::new(
            resolver,
            stores.ledger.clone(),
            stores.messages.clone(),
            bus.clone() as Arc<dyn EventPublisher>,
        ));

        // Delivery path.
        let policy = DeliveryPolicy::from_config(&config.webhooks);
        let attempt = Arc::new(AttemptDeliveryHandler::new(
            stores.deliveries.clone(),
            stores.endpoints.clone(),
            policy,
        ));

        // Job runtime: one executor, two interchangeable modes.
        let executor = Arc::new(PipelineJobExecutor::new(ingest, attempt.clone()));
        let (job_queue, worker_pool): (Arc<dyn JobQueue>, Option<WorkerPool>) =
            match config.jobs.mode {
                JobMode::Queued => {
                    let pool = WorkerPool::start(executor, &config.jobs);
                    (Arc::new(pool.queue()), Some(pool))
                }
                JobMode::Inline => (
                    Arc::new(InlineJobQueue::new(executor, &config.jobs)),
                    None,
                ),
            };
        attempt.set_job_queue(job_queue.clone());

        // Bus subscribers: webhook dispatch and viewer fan-out.
        Arc::new(WebhookDispatchHandler::new(
            stores.endpoints.clone(),
            stores.deliveries.clone(),
            job_queue.clone(),
        ))
        .register(bus.as_ref());
        Arc::new(TicketFeedBridge::new(feed.clone())).register(bus.as_ref());

        // Telegram runs its own long-lived stream connector.
        let telegram_task = adapters.telegram().map(|telegram| {
            let connector = TelegramConnector::new(telegram, job_queue.clone());
            let shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move { connector.run(shutdown_rx).await })
        });

        let handlers = Handlers {
            open_ticket: Arc::new(OpenTicketThreadHandler::new(
                stores.tickets.clone(),
                stores.messages.clone(),
                stores.installations.clone(),
                adapters.clone(),
                bus.clone() as Arc<dyn EventPublisher>,
            )),
            post_reply: Arc::new(PostAgentReplyHandler::new(
                stores.tickets.clone(),
                stores.messages.clone(),
                stores.installations.clone(),
                adapters.clone(),
                bus.clone() as Arc<dyn EventPublisher>,
            )),
            update_status: Arc::new(UpdateTicketStatusHandler::new(
                stores.tickets,
                bus as Arc<dyn EventPublisher>,
            )),
            job_queue: job_queue.clone(),
        };

        let router = build_router(
            HookState::new(adapters, job_queue),
            WebSocketState::new(feed.clone()),
            SseState::new(feed.clone()),
        );

        Self {
            router,
            handlers,
            feed,
            worker_pool,
            telegram_task,
            shutdown_tx,
        }
    }

    /// Serve until the shutdown future resolves, then tear down the
    /// background tasks in order.
    pub async fn run(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let App {
            router,
            worker_pool,
            telegram_task,
            shutdown_tx,
            ..
        } = self;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        let _ = shutdown_tx.send(true);
        if let Some(task) = telegram_task {
            let _ = task.await;
        }
        if let Some(pool) = worker_pool {
            pool.shutdown().await;
        }

        Ok(())
    }
}
