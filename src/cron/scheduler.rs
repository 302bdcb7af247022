//! Cron scheduler for periodic background tasks.
//!
//! Runs the stablecoin snapshot job on a fixed interval, and once at
//! startup when configured to and the last checkpoint is older than one
//! interval.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};
use time::OffsetDateTime;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::CronSettings;
use crate::db::Database;
use crate::processor::Ranking;
use crate::provider::LlamaClient;

use super::jobs;

/// Cron scheduler that manages periodic background jobs.
pub struct CronScheduler {
    db: Arc<Database>,
    client: Arc<LlamaClient>,
    settings: Arc<CronSettings>,
    ranking: Ranking,
}

impl CronScheduler {
    pub fn new(
        db: Arc<Database>,
        client: Arc<LlamaClient>,
        settings: CronSettings,
        ranking: Ranking,
    ) -> Self {
        Self {
            db,
            client,
            settings: Arc::new(settings),
            ranking,
        }
    }

    /// Starts the cron scheduler and runs until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        self.register_stablecoin_snapshots_job(&scheduler).await?;

        scheduler.start().await?;
        info!("Cron scheduler started");

        if self.settings.run_on_startup {
            self.run_stablecoin_snapshots_now(&cancellation_token).await;
        }

        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    /// First snapshot without waiting a full interval. Skipped if a recent
    /// checkpoint exists or shutdown arrives first.
    async fn run_stablecoin_snapshots_now(&self, cancellation_token: &CancellationToken) {
        let last_run = match self
            .db
            .postgres
            .get_cron_checkpoint(jobs::stablecoin_snapshots::JOB_NAME)
            .await
        {
            Ok(last_run) => last_run,
            Err(e) => {
                warn!("Failed to read snapshot checkpoint: {:#}", e);
                None
            },
        };

        let interval = self.settings.snapshot_interval_secs;
        if !is_due(last_run, OffsetDateTime::now_utc(), interval) {
            info!("Skipping startup snapshot, last run within {}s", interval);
            return;
        }

        let top_n = self.settings.top_movers;
        tokio::select! {
            result = jobs::stablecoin_snapshots::run(&self.db, &self.client, self.ranking, top_n) => {
                if let Err(e) = result {
                    error!("Failed to take stablecoin snapshots: {:#}", e);
                }
            },
            _ = cancellation_token.cancelled() => {},
        }
    }

    async fn register_stablecoin_snapshots_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let db = self.db.clone();
        let client = self.client.clone();
        let ranking = self.ranking;
        let top_n = self.settings.top_movers;
        let interval = self.settings.snapshot_interval_secs;

        let job = Job::new_repeated_async(Duration::from_secs(interval), move |_uuid, _lock| {
            let db = db.clone();
            let client = client.clone();
            Box::pin(async move {
                if let Err(e) =
                    jobs::stablecoin_snapshots::run(&db, &client, ranking, top_n).await
                {
                    error!("Failed to take stablecoin snapshots: {:#}", e);
                }
            })
        })?;

        scheduler.add(job).await?;
        info!(
            "Registered {} job (every {}s)",
            jobs::stablecoin_snapshots::JOB_NAME,
            interval
        );
        Ok(())
    }
}

/// Whether a job last run at `last_run` is due again at `now`.
fn is_due(last_run: Option<OffsetDateTime>, now: OffsetDateTime, interval_secs: u64) -> bool {
    match last_run {
        Some(last_run) => (now - last_run).whole_seconds() >= interval_secs as i64,
        None => true,
    }
}
