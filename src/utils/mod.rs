//! Utility functions for the stables service.
//!
//! - [`conversion`] - timestamp conversions between `time` and `chrono`

mod conversion;

pub use conversion::{chrono_to_offset, offset_to_chrono};
