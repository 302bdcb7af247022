mod config;

pub use self::config::{
    CronSettings, PostgresSettings, ProviderSettings, RankingSettings, Settings,
};
