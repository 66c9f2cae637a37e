//! Daytime temperature aggregation.
//!
//! Timestamps are the provider's naive local datetimes; no timezone
//! conversion happens here. A sample counts as daytime when its hour is in
//! `DAYTIME_START_HOUR..=DAYTIME_END_HOUR`.

use chrono::{Duration, NaiveDate, Timelike};
use std::collections::BTreeMap;

use crate::db::models::StoredSample;
use crate::timestamps::parse_local_timestamp;

/// First hour (inclusive) of the daytime window.
pub const DAYTIME_START_HOUR: u32 = 6;
/// Last hour (inclusive) of the daytime window.
pub const DAYTIME_END_HOUR: u32 = 18;
/// Length of the forward-looking report window, starting today.
pub const WEEK_DAYS: i64 = 7;

/// `[today, today + 7 days)`.
pub fn week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(WEEK_DAYS))
}

/// Round to 2 decimals on the exact binary value, ties to even
/// (`0.125` becomes `0.12`, `0.135` stored as 0.13500...01 becomes `0.14`).
fn round_2dp(v: f64) -> f64 {
    format!("{:.2}", v).parse().unwrap_or(v)
}

/// Mean daytime temperature per calendar date, rounded to 2 decimals.
///
/// Dates without any daytime sample are left out entirely.
pub fn daily_daytime_average(samples: &[StoredSample]) -> BTreeMap<NaiveDate, f64> {
    let mut sums: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();

    for sample in samples {
        let Some(dt) = parse_local_timestamp(&sample.timestamp) else {
            tracing::warn!(
                "Skipping sample with unparseable timestamp '{}'",
                sample.timestamp
            );
            continue;
        };
        if !(DAYTIME_START_HOUR..=DAYTIME_END_HOUR).contains(&dt.hour()) {
            continue;
        }
        let entry = sums.entry(dt.date()).or_insert((0.0, 0));
        entry.0 += sample.temperature;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(date, (sum, count))| (date, round_2dp(sum / count as f64)))
        .collect()
}
