use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::processor::AssetRow;

/// One stablecoin's supply and change metrics at one fetch (PostgreSQL).
///
/// Primary Key: (fetched_at, asset_id)
///
/// Query Patterns:
///   - "Get the latest snapshot for every stablecoin"
///   - "Get circulating supply history for stablecoin X"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StablecoinSnapshot {
    // Primary key
    pub fetched_at: DateTime<Utc>,
    pub asset_id: String,

    // Identity and peg metadata
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub gecko_id: Option<String>,
    pub peg_type: Option<String>,
    pub peg_mechanism: Option<String>,
    pub price_source: Option<String>,
    pub price: f64,

    // Supply snapshots
    pub circulating: f64,
    pub circulating_prev_day: f64,
    pub circulating_prev_week: f64,
    pub circulating_prev_month: f64,
    pub chains: Vec<String>,

    // Change metrics (NULL percentage = previous supply was zero)
    pub change_day: f64,
    pub change_day_pct: Option<f64>,
    pub change_week: f64,
    pub change_week_pct: Option<f64>,
    pub change_month: f64,
    pub change_month_pct: Option<f64>,
}

impl StablecoinSnapshot {
    /// Build from a processed row. `None` when the asset has no id.
    pub fn from_row(fetched_at: DateTime<Utc>, row: &AssetRow) -> Option<Self> {
        let asset = &row.record;
        let changes = &row.changes;

        Some(Self {
            fetched_at,
            asset_id: asset.id.clone()?,
            name: asset.name.clone(),
            symbol: asset.symbol.clone(),
            gecko_id: asset.gecko_id.clone(),
            peg_type: asset.peg_type.clone(),
            peg_mechanism: asset.peg_mechanism.clone(),
            price_source: asset.price_source.clone(),
            price: asset.price,
            circulating: asset.circulating_current,
            circulating_prev_day: asset.circulating_prev_day,
            circulating_prev_week: asset.circulating_prev_week,
            circulating_prev_month: asset.circulating_prev_month,
            chains: asset.chains.clone(),
            change_day: changes.delta_day,
            change_day_pct: changes.pct_day.value(),
            change_week: changes.delta_week,
            change_week_pct: changes.pct_week.value(),
            change_month: changes.delta_month,
            change_month_pct: changes.pct_month.value(),
        })
    }
}
