use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modbot_pipeline::clients::{
    ClientConfig, HttpAnswerGenerator, HttpClassifier, HttpPlatformGateway, WebhookAlertNotifier,
};
use modbot_pipeline::config::PipelineConfig;
use modbot_queue::lock::RedisLockStore;
use modbot_queue::TaskQueue;
use modbot_worker::config::WorkerConfig;
use modbot_worker::dispatcher::TaskDispatcher;
use modbot_worker::executor::StageRunner;
use modbot_worker::sweeper::RetrySweeper;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modbot_worker=debug,modbot_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let worker_config = WorkerConfig::from_env().expect("Invalid worker configuration");
    let pipeline_config = PipelineConfig::from_env().expect("Invalid pipeline configuration");
    let client_config = ClientConfig::from_env().expect("Invalid client configuration");
    tracing::info!(
        concurrency = worker_config.concurrency,
        poll_interval_ms = worker_config.poll_interval.as_millis() as u64,
        "Loaded worker configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = modbot_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    modbot_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // Migrations are applied here too so the worker can start on a fresh
    // database without waiting for the API process.
    modbot_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Lock store ---
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
    let locks = RedisLockStore::connect(&redis_url)
        .await
        .expect("Failed to connect to Redis");
    tracing::info!("Redis lock store connected");

    // --- Collaborators ---
    // The platform gateway doubles as the media resolver; both talk to the
    // same upstream.
    let gateway = Arc::new(HttpPlatformGateway::new(client_config.gateway_url));
    let runner = Arc::new(StageRunner::new(
        pool.clone(),
        TaskQueue::new(pool.clone()),
        Arc::new(locks),
        Arc::new(HttpClassifier::new(client_config.model_service_url.clone())),
        gateway.clone(),
        Arc::new(HttpAnswerGenerator::new(client_config.model_service_url)),
        gateway,
        Arc::new(WebhookAlertNotifier::new(client_config.alert_webhook_url)),
        Duration::from_secs(pipeline_config.action_lock_ttl_secs),
    ));

    // --- Background loops ---
    let cancel = CancellationToken::new();

    let dispatcher = TaskDispatcher::new(
        pool.clone(),
        runner,
        worker_config.poll_interval,
        worker_config.concurrency,
    );
    let dispatcher_cancel = cancel.clone();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(dispatcher_cancel).await;
    });

    let sweeper = RetrySweeper::new(
        pool.clone(),
        TaskQueue::new(pool),
        worker_config.sweep_interval,
    );
    let sweeper_cancel = cancel.clone();
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(sweeper_cancel).await;
    });

    // --- Shutdown ---
    shutdown_signal().await;
    cancel.cancel();

    // Give the loops a moment to finish their current cycle.
    let drain = async {
        let _ = dispatcher_handle.await;
        let _ = sweeper_handle.await;
    };
    if tokio::time::timeout(Duration::from_secs(30), drain).await.is_err() {
        tracing::warn!("Background loops did not stop within 30s, exiting anyway");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the worker
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
