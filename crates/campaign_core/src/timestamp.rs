//! Conversion between the header's tick timestamp and calendar time.
//!
//! Ticks are 100 ns intervals since 0001-01-01T00:00:00Z.

use chrono::{DateTime, Utc};

pub const TICKS_PER_SECOND: i64 = 10_000_000;
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

pub fn ticks_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    let since_unix = ticks.checked_sub(UNIX_EPOCH_TICKS)?;
    let secs = since_unix.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_unix.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

pub fn datetime_to_ticks(dt: DateTime<Utc>) -> i64 {
    dt.timestamp() * TICKS_PER_SECOND
        + i64::from(dt.timestamp_subsec_nanos() / 100)
        + UNIX_EPOCH_TICKS
}

pub fn now_ticks() -> i64 {
    datetime_to_ticks(Utc::now())
}
