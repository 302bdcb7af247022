use std::sync::Arc;

use anyhow::Context;
use log::info;

use crate::config::Settings;

pub mod models;
pub mod postgres;

pub use postgres::PostgresClient;

/// Database handle shared by the scheduler and its jobs.
///
/// PostgreSQL stores per-fetch stablecoin and chain rows plus job
/// checkpoints. Dashboards read from it; nothing here computes metrics.
#[derive(Clone)]
pub struct Database {
    pub postgres: Arc<PostgresClient>,
}

impl Database {
    /// Connect and apply the bundled schema.
    pub async fn new(settings: Arc<Settings>) -> anyhow::Result<Self> {
        let postgres = PostgresClient::new(settings.postgres.clone()).await?;

        postgres
            .migrate()
            .await
            .context("Failed to apply PostgreSQL schema")?;

        info!("Database ready");

        Ok(Self {
            postgres: Arc::new(postgres),
        })
    }
}
