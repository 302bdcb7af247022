//! Timestamp conversions.
//!
//! The scheduler and checkpoints work in `time::OffsetDateTime`; rows bound
//! to PostgreSQL use `chrono::DateTime<Utc>` (tokio-postgres `with-chrono`).

use chrono::{DateTime, Utc};
use time::OffsetDateTime;

/// Convert an `OffsetDateTime` to a UTC chrono timestamp, keeping nanoseconds.
pub fn offset_to_chrono(ts: OffsetDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts.unix_timestamp(), ts.nanosecond()).unwrap_or_default()
}

/// Convert a UTC chrono timestamp to an `OffsetDateTime`, keeping nanoseconds.
pub fn chrono_to_offset(ts: DateTime<Utc>) -> anyhow::Result<OffsetDateTime> {
    Ok(OffsetDateTime::from_unix_timestamp(ts.timestamp())?
        .replace_nanosecond(ts.timestamp_subsec_nanos())?)
}
