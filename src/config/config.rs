use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::processor::{Direction, Ranking, SortKey};

/// PostgreSQL connection configuration.
///
/// Used for storing:
/// - Per-fetch stablecoin snapshots with change metrics
/// - Per-fetch chain circulation rows
/// - Cron job checkpoints
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    16
}

/// Stablecoin data provider (DefiLlama stablecoins API).
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Ask the listing endpoint to include prices
    #[serde(default = "default_include_prices")]
    pub include_prices: bool,
    /// Retries on 429 / 5xx before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            include_prices: default_include_prices(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://stablecoins.llama.fi".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_include_prices() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

/// Configuration for cron job intervals
#[derive(Debug, Deserialize, Clone)]
pub struct CronSettings {
    /// Interval for fetching and storing stablecoin snapshots - default 1 hour
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
    /// Take one snapshot immediately instead of waiting a full interval
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
    /// Rows listed in the job's top movers log line
    #[serde(default = "default_top_movers")]
    pub top_movers: usize,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: default_snapshot_interval_secs(),
            run_on_startup: default_run_on_startup(),
            top_movers: default_top_movers(),
        }
    }
}

fn default_snapshot_interval_secs() -> u64 {
    3600
}

fn default_run_on_startup() -> bool {
    true
}

fn default_top_movers() -> usize {
    5
}

/// Ordering applied to both output tables.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RankingSettings {
    #[serde(default = "default_sort_key")]
    pub key: SortKey,
    #[serde(default = "default_direction")]
    pub direction: Direction,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            key: default_sort_key(),
            direction: default_direction(),
        }
    }
}

impl From<RankingSettings> for Ranking {
    fn from(settings: RankingSettings) -> Self {
        Ranking::new(settings.key, settings.direction)
    }
}

fn default_sort_key() -> SortKey {
    SortKey::PctDay
}

fn default_direction() -> Direction {
    Direction::Ascending
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup, overridable through `STABLES__*`
/// environment variables (e.g. `STABLES__POSTGRES__PASSWORD`).
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub cron: CronSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .add_source(Environment::with_prefix("STABLES").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Parse settings from an in-memory YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }
}
