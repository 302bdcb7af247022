//! Job to fetch, process and store stablecoin supply snapshots.
//!
//! Pulls the provider listing, runs the normalization pipeline and writes
//! both the asset-level and chain-level tables to PostgreSQL.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::db::models::{ChainCirculation, StablecoinSnapshot};
use crate::db::Database;
use crate::processor::{self, top_movers, AssetRow, Horizon, Ranking, Snapshot};
use crate::provider::LlamaClient;
use crate::utils::offset_to_chrono;

pub const JOB_NAME: &str = "stablecoin_snapshots";

/// Persistable rows for one fetch.
#[derive(Debug, Default)]
pub struct SnapshotBatch {
    pub stablecoins: Vec<StablecoinSnapshot>,
    pub chains: Vec<ChainCirculation>,
    /// Rows left out because the asset had no id
    pub dropped: usize,
}

impl SnapshotBatch {
    pub fn from_snapshot(fetched_at: DateTime<Utc>, snapshot: &Snapshot) -> Self {
        let mut batch = Self::default();

        for row in &snapshot.assets {
            match StablecoinSnapshot::from_row(fetched_at, row) {
                Some(model) => batch.stablecoins.push(model),
                None => batch.dropped += 1,
            }
        }
        for row in &snapshot.chains {
            match ChainCirculation::from_row(fetched_at, row) {
                Some(model) => batch.chains.push(model),
                None => batch.dropped += 1,
            }
        }

        batch
    }
}

/// Fetches the listing, processes it and stores the result.
pub async fn run(
    db: &Database,
    client: &LlamaClient,
    ranking: Ranking,
    top_n: usize,
) -> Result<()> {
    info!("Starting {} job...", JOB_NAME);

    let start = std::time::Instant::now();
    let now = time::OffsetDateTime::now_utc();

    let response = client
        .get_stablecoins()
        .await
        .context("Failed to fetch stablecoin listing")?;

    let snapshot = processor::process(&response, ranking)?;

    if !snapshot.diagnostics.is_empty() {
        warn!(
            "{} data-quality diagnostics in provider response",
            snapshot.diagnostics.len()
        );
        for diagnostic in snapshot.diagnostics.iter() {
            debug!("{}", diagnostic);
        }
    }

    let batch = SnapshotBatch::from_snapshot(offset_to_chrono(now), &snapshot);
    if batch.dropped > 0 {
        warn!("Not storing {} rows without an asset id", batch.dropped);
    }

    let stablecoins = db
        .postgres
        .insert_stablecoin_snapshots(&batch.stablecoins)
        .await?;
    let chains = db.postgres.insert_chain_circulation(&batch.chains).await?;

    db.postgres.set_cron_checkpoint(JOB_NAME, now).await?;

    if top_n > 0 {
        info!("Top movers (24h): {}", describe_movers(&snapshot.assets, top_n));
    }

    info!(
        "Completed {} job in {:?} ({} stablecoins, {} chain rows)",
        JOB_NAME,
        start.elapsed(),
        stablecoins,
        chains
    );
    Ok(())
}

/// One-line summary of the largest day-over-day supply changes.
pub fn describe_movers(rows: &[AssetRow], n: usize) -> String {
    let movers = top_movers(rows, Horizon::Day, n);
    if movers.is_empty() {
        return "none".to_string();
    }

    movers
        .iter()
        .map(|row| {
            let label = row
                .record
                .symbol
                .as_deref()
                .or(row.record.name.as_deref())
                .unwrap_or("?");
            let pct = row.changes.pct_day.value().unwrap_or_default();
            format!("{} {:+.2}%", label, pct)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
