//! Temporal classification
//!
//! Maps timestamps onto day/night clusters and measures elapsed minutes.
//! Every function reads the hour or date in the timestamp's own offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike};

use crate::config::{DEFAULT_DAY_START_HOUR, DEFAULT_NIGHT_START_HOUR};
use crate::types::Cluster;

/// Classify a timestamp with the default 06:00-20:00 day window
pub fn cluster_of(timestamp: &DateTime<FixedOffset>) -> Cluster {
    cluster_with_hours(timestamp, DEFAULT_DAY_START_HOUR, DEFAULT_NIGHT_START_HOUR)
}

/// Day if the local hour is in `[day_start_hour, night_start_hour)`, otherwise night
pub fn cluster_with_hours(
    timestamp: &DateTime<FixedOffset>,
    day_start_hour: u32,
    night_start_hour: u32,
) -> Cluster {
    let hour = timestamp.hour();
    if hour >= day_start_hour && hour < night_start_hour {
        Cluster::Day
    } else {
        Cluster::Night
    }
}

/// Minutes from `a` to `b`, negative if `b` precedes `a`
pub fn minutes_between(a: &DateTime<FixedOffset>, b: &DateTime<FixedOffset>) -> f64 {
    (*b - *a).num_milliseconds() as f64 / 60_000.0
}

/// Shift a timestamp by a fractional number of minutes (millisecond precision)
pub fn offset_by_minutes(timestamp: &DateTime<FixedOffset>, minutes: f64) -> DateTime<FixedOffset> {
    *timestamp + Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

/// Whole weeks between a birth date and the reference time's local date
pub fn age_in_weeks(birth_date: NaiveDate, reference_time: &DateTime<FixedOffset>) -> u32 {
    let days = (reference_time.date_naive() - birth_date).num_days();
    if days <= 0 {
        return 0;
    }
    (days / 7) as u32
}
