//! Wake-window estimation
//!
//! A wake window is the time from the end of one sleep episode to the start of
//! the next. Windows are estimated per cluster so that daytime nap rhythm and
//! night waking are never mixed.

use tracing::debug;

use crate::config::{EngineConfig, MinuteBounds};
use crate::stats::{remove_outliers, summarize};
use crate::temporal::{cluster_with_hours, minutes_between};
use crate::types::{Cluster, IntervalStatistics, SleepEpisode, WakeWindowSummary};

/// Episodes ordered by start time, oldest first
pub(crate) fn sorted_by_start(sessions: &[SleepEpisode]) -> Vec<&SleepEpisode> {
    let mut sorted: Vec<&SleepEpisode> = sessions.iter().collect();
    sorted.sort_by_key(|s| s.start_time);
    sorted
}

/// Gaps between consecutive completed episodes that fall inside `bounds`.
///
/// Episodes must already be in chronological order. Open episodes are skipped.
pub fn wake_windows<'a, I>(episodes: I, bounds: MinuteBounds) -> Vec<f64>
where
    I: IntoIterator<Item = &'a SleepEpisode>,
{
    let completed: Vec<&SleepEpisode> = episodes.into_iter().filter(|s| !s.is_open()).collect();

    completed
        .windows(2)
        .filter_map(|pair| {
            let woke = pair[0].end_time?;
            let gap = minutes_between(&woke, &pair[1].start_time);
            bounds.contains(gap).then_some(gap)
        })
        .collect()
}

/// Filtered wake windows for one cluster, oldest first
pub fn wake_window_samples(
    sessions: &[SleepEpisode],
    cluster: Cluster,
    config: &EngineConfig,
) -> Vec<f64> {
    let in_cluster: Vec<&SleepEpisode> = sorted_by_start(sessions)
        .into_iter()
        .filter(|s| !s.is_open())
        .filter(|s| {
            cluster_with_hours(&s.start_time, config.day_start_hour, config.night_start_hour)
                == cluster
        })
        .collect();

    let skip = in_cluster.len().saturating_sub(config.lookback);
    let recent = &in_cluster[skip..];

    let raw = wake_windows(recent.iter().copied(), config.wake_window_bounds);
    let filtered = remove_outliers(&raw, config.outlier_z_threshold);

    debug!(
        cluster = cluster.as_str(),
        episodes = recent.len(),
        raw_windows = raw.len(),
        kept_windows = filtered.len(),
        "wake window samples"
    );

    filtered
}

/// Wake-window statistics for one cluster using the default configuration
pub fn build_wake_window_stats(sessions: &[SleepEpisode], cluster: Cluster) -> IntervalStatistics {
    build_wake_window_stats_with_config(sessions, cluster, &EngineConfig::default())
}

/// Wake-window statistics for one cluster
pub fn build_wake_window_stats_with_config(
    sessions: &[SleepEpisode],
    cluster: Cluster,
    config: &EngineConfig,
) -> IntervalStatistics {
    let samples = wake_window_samples(sessions, cluster, config);
    summarize(&samples, config.ewma_alpha)
}

/// Day and night statistics side by side
pub fn wake_window_summary(sessions: &[SleepEpisode], config: &EngineConfig) -> WakeWindowSummary {
    WakeWindowSummary {
        day: build_wake_window_stats_with_config(sessions, Cluster::Day, config),
        night: build_wake_window_stats_with_config(sessions, Cluster::Night, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, nap, night, sleep};
    use crate::types::SleepCategory;

    fn three_night_sleeps() -> Vec<SleepEpisode> {
        // Wake windows of 100 and 105 minutes, all starting at night
        vec![
            night("2024-03-10T20:00:00+00:00", "2024-03-10T22:00:00+00:00"),
            night("2024-03-10T23:40:00+00:00", "2024-03-11T01:40:00+00:00"),
            night("2024-03-11T03:25:00+00:00", "2024-03-11T05:00:00+00:00"),
        ]
    }

    #[test]
    fn test_single_episode_has_no_samples() {
        let sessions = vec![nap("2024-03-10T09:00:00+00:00", "2024-03-10T10:00:00+00:00")];
        let stats = build_wake_window_stats(&sessions, Cluster::Day);
        assert_eq!(stats, IntervalStatistics::default());
        assert_eq!(stats.sample_size, 0);
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(build_wake_window_stats(&[], Cluster::Night).sample_size, 0);
    }

    #[test]
    fn test_night_gaps_weighted_toward_recent() {
        let stats = build_wake_window_stats(&three_night_sleeps(), Cluster::Night);
        assert_eq!(stats.sample_size, 2);
        assert!((stats.mean - 102.5).abs() < 1e-9);
        assert!((stats.weighted_mean - 105.0).abs() < (stats.weighted_mean - 100.0).abs());
        // Nothing starts during the day
        assert_eq!(build_wake_window_stats(&three_night_sleeps(), Cluster::Day).sample_size, 0);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut sessions = three_night_sleeps();
        sessions.reverse();
        let stats = build_wake_window_stats(&sessions, Cluster::Night);
        assert_eq!(stats.sample_size, 2);
        assert!((stats.mean - 102.5).abs() < 1e-9);
    }

    #[test]
    fn test_implausible_gaps_are_dropped() {
        let sessions = vec![
            nap("2024-03-10T08:00:00+00:00", "2024-03-10T09:00:00+00:00"),
            // 10 minute gap: too short
            nap("2024-03-10T09:10:00+00:00", "2024-03-10T10:00:00+00:00"),
            // 120 minute gap
            nap("2024-03-10T12:00:00+00:00", "2024-03-10T13:00:00+00:00"),
            // next day, 19h gap: too long
            nap("2024-03-11T08:00:00+00:00", "2024-03-11T09:00:00+00:00"),
        ];
        let stats = build_wake_window_stats(&sessions, Cluster::Day);
        assert_eq!(stats.sample_size, 1);
        assert!((stats.weighted_mean - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_episode_is_ignored() {
        let mut sessions = vec![
            nap("2024-03-10T09:00:00+00:00", "2024-03-10T10:00:00+00:00"),
            nap("2024-03-10T12:00:00+00:00", "2024-03-10T13:00:00+00:00"),
        ];
        sessions.push(sleep("2024-03-10T15:00:00+00:00", None, SleepCategory::Nap));
        let stats = build_wake_window_stats(&sessions, Cluster::Day);
        assert_eq!(stats.sample_size, 1);
        assert!((stats.mean - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_lookback_trims_oldest() {
        // Eight naps on consecutive mornings with a second nap after a fixed gap.
        // Gaps grow each day; with lookback 4 only the last two days survive.
        let mut sessions = Vec::new();
        for day in 1..=8 {
            let first_end = format!("2024-03-{day:02}T09:00:00+00:00");
            let first_start = format!("2024-03-{day:02}T08:00:00+00:00");
            let second_start_min = 30 + day * 10;
            let second_start = at(&first_end) + chrono::Duration::minutes(second_start_min);
            let second_end = second_start + chrono::Duration::minutes(45);
            sessions.push(nap(&first_start, &first_end));
            sessions.push(nap(&second_start.to_rfc3339(), &second_end.to_rfc3339()));
        }
        let config = EngineConfig {
            lookback: 4,
            ..Default::default()
        };
        let samples = wake_window_samples(&sessions, Cluster::Day, &config);
        // Pairs within the last four episodes: day 7 gap, (day7 -> day8 is too long), day 8 gap
        assert_eq!(samples, vec![100.0, 110.0]);
    }

    #[test]
    fn test_outliers_removed_from_samples() {
        let mut sessions = Vec::new();
        let gaps = [30, 32, 28, 31, 29, 30, 33, 27, 30, 31, 120];
        let mut cursor = at("2024-03-10T06:00:00+00:00");
        for gap in gaps {
            let end = cursor + chrono::Duration::minutes(5);
            sessions.push(nap(&cursor.to_rfc3339(), &end.to_rfc3339()));
            cursor = end + chrono::Duration::minutes(gap);
        }
        let end = cursor + chrono::Duration::minutes(5);
        sessions.push(nap(&cursor.to_rfc3339(), &end.to_rfc3339()));

        let config = EngineConfig {
            lookback: 20,
            ..Default::default()
        };
        let samples = wake_window_samples(&sessions, Cluster::Day, &config);
        assert_eq!(samples.len(), 10);
        assert!(!samples.contains(&120.0));
    }

    #[test]
    fn test_summary_covers_both_clusters() {
        let mut sessions = three_night_sleeps();
        sessions.push(nap("2024-03-11T09:00:00+00:00", "2024-03-11T10:00:00+00:00"));
        sessions.push(nap("2024-03-11T12:00:00+00:00", "2024-03-11T13:30:00+00:00"));
        let summary = wake_window_summary(&sessions, &EngineConfig::default());
        assert_eq!(summary.night.sample_size, 2);
        assert_eq!(summary.day.sample_size, 1);
        assert!((summary.day.mean - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_idempotent() {
        let sessions = three_night_sleeps();
        let first = build_wake_window_stats(&sessions, Cluster::Night);
        let second = build_wake_window_stats(&sessions, Cluster::Night);
        assert_eq!(first.weighted_mean.to_bits(), second.weighted_mean.to_bits());
        assert_eq!(first, second);
    }
}
