use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};

/// Decodes a stored epoch-millisecond timestamp. Out-of-range values are an error.
pub fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| anyhow!("timestamp {}ms is out of range", ms))
}

/// Fractional seconds from `earlier` to `later`; negative when the clock went backwards.
pub fn elapsed_seconds(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}
