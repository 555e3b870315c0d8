//! .NET-style tick timestamps.
//!
//! Date columns in the library store hold ticks: 100 ns intervals since
//! 0001-01-01T00:00:00.

use chrono::{Local, NaiveDateTime};

const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;

/// Seconds between 0001-01-01 and the Unix epoch.
const EPOCH_OFFSET_SECS: i64 = 62_135_596_800;

/// Convert a wall-clock time to ticks.
pub fn from_naive(time: NaiveDateTime) -> i64 {
    let utc = time.and_utc();
    (utc.timestamp() + EPOCH_OFFSET_SECS) * TICKS_PER_SECOND
        + i64::from(utc.timestamp_subsec_nanos()) / NANOS_PER_TICK
}

/// Ticks for the current local time.
pub fn now() -> i64 {
    from_naive(Local::now().naive_local())
}
