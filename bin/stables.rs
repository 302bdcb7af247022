use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use stables::{CronScheduler, Database, LlamaClient, Settings};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .context("Failed to initialize logger")?;

    // Load configuration
    let settings = Arc::new(
        Settings::new()
            .context("Failed to load config.yaml. Please ensure it exists and is valid")?,
    );

    let db = Arc::new(
        Database::new(settings.clone())
            .await
            .context("Failed to initialize database connection")?,
    );

    db.postgres
        .health_check()
        .await
        .context("PostgreSQL is not reachable")?;

    let client = Arc::new(
        LlamaClient::new(&settings.provider).context("Failed to create provider client")?,
    );

    let cancellation_token = CancellationToken::new();

    run_collector(settings, db, client, cancellation_token).await
}

async fn run_collector(
    settings: Arc<Settings>,
    db: Arc<Database>,
    client: Arc<LlamaClient>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let scheduler = CronScheduler::new(db, client, settings.cron.clone(), settings.ranking.into());

    let scheduler_token = cancellation_token.child_token();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(scheduler_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    info!(
        "Collecting stablecoin snapshots every {}s. Press Ctrl+C to stop.",
        settings.cron.snapshot_interval_secs
    );

    let signal = shutdown_signal().await?;
    info!("Received {}, shutting down...", signal);

    cancellation_token.cancel();
    if let Err(e) = scheduler_handle.await {
        error!("Cron scheduler task panicked: {}", e);
    }

    info!("Collector stopped");
    Ok(())
}

/// Resolves with the name of the first shutdown signal received.
#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            Ok("Ctrl+C")
        },
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    Ok("Ctrl+C")
}
