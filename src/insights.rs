//! Daily insights
//!
//! Literal same-day aggregates. No lookback, no outlier filtering: these
//! figures describe what happened, not what is expected.

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::stats::mean;
use crate::types::{DailyInsights, FeedingEpisode, SleepCategory, SleepEpisode};
use crate::wake_window::{sorted_by_start, wake_windows};

/// Insights for `date` with the default configuration
pub fn compute_daily_insights(
    date: NaiveDate,
    sleep_sessions: &[SleepEpisode],
    feeding_sessions: &[FeedingEpisode],
) -> DailyInsights {
    compute_daily_insights_with_config(date, sleep_sessions, feeding_sessions, &EngineConfig::default())
}

/// Summarise the episodes that started on `date` (local to each timestamp)
pub fn compute_daily_insights_with_config(
    date: NaiveDate,
    sleep_sessions: &[SleepEpisode],
    feeding_sessions: &[FeedingEpisode],
    config: &EngineConfig,
) -> DailyInsights {
    let today: Vec<&SleepEpisode> = sorted_by_start(sleep_sessions)
        .into_iter()
        .filter(|s| s.start_time.date_naive() == date)
        .collect();

    let mut total_sleep = 0i64;
    let mut night_sleep = 0i64;
    let mut nap_count = 0usize;
    let mut longest_nap = 0i64;

    for episode in &today {
        let Some(minutes) = episode.duration_minutes.map(i64::from) else {
            continue;
        };
        total_sleep += minutes;
        match episode.category {
            SleepCategory::Nap => {
                nap_count += 1;
                longest_nap = longest_nap.max(minutes);
            }
            SleepCategory::Night => night_sleep += minutes,
        }
    }

    let windows = wake_windows(today.iter().copied(), config.wake_window_bounds);

    let feed_count = feeding_sessions
        .iter()
        .filter(|f| f.start_time.date_naive() == date)
        .count();

    DailyInsights {
        date,
        total_sleep_minutes: total_sleep,
        nap_count,
        longest_nap_minutes: longest_nap,
        average_wake_window_minutes: mean(&windows).round() as i64,
        feed_count,
        night_sleep_minutes: night_sleep,
    }
}
