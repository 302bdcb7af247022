//! Periodic background jobs.

pub mod jobs;
mod scheduler;

pub use crate::config::CronSettings;
pub use scheduler::CronScheduler;
