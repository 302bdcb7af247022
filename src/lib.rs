pub mod config;
pub mod cron;
pub mod db;
pub mod error;
pub mod processor;
pub mod provider;
pub mod utils;

pub use config::Settings;
pub use cron::{CronScheduler, CronSettings};
pub use db::Database;
pub use error::ProcessError;
pub use provider::LlamaClient;
