//! Normalization and change-metric pipeline.
//!
//! Pure and synchronous: every stage maps an immutable input to a new
//! collection, so independent snapshots can be processed in parallel.
//!
//! - [`supply`] - scalar extraction of scalar-or-peg-map supply values
//! - [`asset`] - one raw entry to one [`AssetRecord`]
//! - [`chain`] - one raw entry to zero or more [`ChainRecord`]s
//! - [`metrics`] - deltas and percentages per horizon
//! - [`rank`] - ordering for presentation
//! - [`history`] - per-chain balance series from a detail response
//! - [`pipeline`] - the whole thing over one provider response

pub mod asset;
pub mod chain;
pub mod diagnostics;
pub mod history;
pub mod metrics;
pub mod pipeline;
pub mod rank;
pub mod supply;

pub use asset::{normalize_asset, AssetRecord};
pub use chain::{explode_chains, ChainRecord};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use history::{explode_chain_balances, ChainBalancePoint};
pub use metrics::{
    compute_changes, AssetRow, ChainRow, ChangeMetrics, Horizon, Percentage, SupplySnapshots,
    WithChanges,
};
pub use pipeline::{asset_entries, process, Snapshot};
pub use rank::{rank, top_movers, Direction, Ranking, SortKey};
pub use supply::{extract_scalar, SupplyValue};

/// Provider response keys.
pub(crate) mod keys {
    pub const PEGGED_ASSETS: &str = "peggedAssets";

    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const SYMBOL: &str = "symbol";
    pub const GECKO_ID: &str = "gecko_id";
    pub const PEG_TYPE: &str = "pegType";
    pub const PEG_MECHANISM: &str = "pegMechanism";
    pub const PRICE_SOURCE: &str = "priceSource";
    pub const PRICE: &str = "price";

    pub const CIRCULATING: &str = "circulating";
    pub const PREV_DAY: &str = "circulatingPrevDay";
    pub const PREV_WEEK: &str = "circulatingPrevWeek";
    pub const PREV_MONTH: &str = "circulatingPrevMonth";

    pub const CHAIN_CIRCULATING: &str = "chainCirculating";
    /// Present-value key inside a `chainCirculating` entry.
    pub const CHAIN_CURRENT: &str = "current";

    pub const CHAIN_BALANCES: &str = "chainBalances";
    pub const TOKENS: &str = "tokens";
    pub const DATE: &str = "date";
    pub const MINTED: &str = "minted";
}
