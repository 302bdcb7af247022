use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::processor::ChainRow;

/// One stablecoin's supply on one chain at one fetch (PostgreSQL).
///
/// Primary Key: (fetched_at, asset_id, chain)
/// Query Pattern: "Get chain distribution of stablecoin X at the latest fetch"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainCirculation {
    // Primary key
    pub fetched_at: DateTime<Utc>,
    pub asset_id: String,
    pub chain: String,

    // Owning asset (denormalized for dashboards)
    pub name: Option<String>,
    pub symbol: Option<String>,

    // Supply snapshots on this chain
    pub circulating: f64,
    pub circulating_prev_day: f64,
    pub circulating_prev_week: f64,
    pub circulating_prev_month: f64,

    // Change metrics
    pub change_day: f64,
    pub change_day_pct: Option<f64>,
    pub change_week: f64,
    pub change_week_pct: Option<f64>,
    pub change_month: f64,
    pub change_month_pct: Option<f64>,
}

impl ChainCirculation {
    /// Build from a processed row. `None` when the owning asset has no id.
    pub fn from_row(fetched_at: DateTime<Utc>, row: &ChainRow) -> Option<Self> {
        let chain = &row.record;
        let changes = &row.changes;

        Some(Self {
            fetched_at,
            asset_id: chain.asset_id.clone()?,
            chain: chain.chain.clone(),
            name: chain.asset_name.clone(),
            symbol: chain.asset_symbol.clone(),
            circulating: chain.current,
            circulating_prev_day: chain.prev_day,
            circulating_prev_week: chain.prev_week,
            circulating_prev_month: chain.prev_month,
            change_day: changes.delta_day,
            change_day_pct: changes.pct_day.value(),
            change_week: changes.delta_week,
            change_week_pct: changes.pct_week.value(),
            change_month: changes.delta_month,
            change_month_pct: changes.pct_month.value(),
        })
    }
}
