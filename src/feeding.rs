//! Feeding-interval estimation
//!
//! Start-to-start gaps between feeds of the same category, smoothed with the
//! same outlier filter and EWMA as wake windows.

use tracing::debug;

use crate::config::{EngineConfig, MinuteBounds};
use crate::stats::{remove_outliers, summarize};
use crate::temporal::minutes_between;
use crate::types::{FeedCategory, FeedingEpisode, FeedingIntervalStatistics, IntervalStatistics};

/// Feeds of one category ordered by start time, oldest first
pub(crate) fn category_feeds<'a>(
    sessions: &'a [FeedingEpisode],
    category: &FeedCategory,
) -> Vec<&'a FeedingEpisode> {
    let mut feeds: Vec<&FeedingEpisode> = sessions
        .iter()
        .filter(|s| &s.feed_category == category)
        .collect();
    feeds.sort_by_key(|s| s.start_time);
    feeds
}

/// Categories in the order they first appear in the input
pub fn distinct_categories(sessions: &[FeedingEpisode]) -> Vec<FeedCategory> {
    let mut seen: Vec<FeedCategory> = Vec::new();
    for session in sessions {
        if !seen.contains(&session.feed_category) {
            seen.push(session.feed_category.clone());
        }
    }
    seen
}

/// Start-to-start gaps inside `bounds` for feeds already in chronological order
pub fn feeding_intervals(feeds: &[&FeedingEpisode], bounds: MinuteBounds) -> Vec<f64> {
    feeds
        .windows(2)
        .map(|pair| minutes_between(&pair[0].start_time, &pair[1].start_time))
        .filter(|gap| bounds.contains(*gap))
        .collect()
}

/// Interval statistics for one category using the default configuration
pub fn build_feeding_interval_stats(
    sessions: &[FeedingEpisode],
    category: &FeedCategory,
) -> FeedingIntervalStatistics {
    build_feeding_interval_stats_with_config(sessions, category, &EngineConfig::default())
}

/// Interval statistics for one category
pub fn build_feeding_interval_stats_with_config(
    sessions: &[FeedingEpisode],
    category: &FeedCategory,
    config: &EngineConfig,
) -> FeedingIntervalStatistics {
    let feeds = category_feeds(sessions, category);
    let skip = feeds.len().saturating_sub(config.lookback);
    let recent = &feeds[skip..];

    if recent.len() < 2 {
        return FeedingIntervalStatistics {
            feed_category: category.clone(),
            stats: IntervalStatistics {
                sample_size: recent.len(),
                ..Default::default()
            },
        };
    }

    let raw = feeding_intervals(recent, config.feeding_interval_bounds);
    let cleaned = remove_outliers(&raw, config.outlier_z_threshold);

    debug!(
        category = category.as_str(),
        feeds = recent.len(),
        raw_intervals = raw.len(),
        kept_intervals = cleaned.len(),
        "feeding interval samples"
    );

    FeedingIntervalStatistics {
        feed_category: category.clone(),
        stats: summarize(&cleaned, config.ewma_alpha),
    }
}

/// Statistics for the standard categories, then any other category observed
pub fn feeding_interval_summary(
    sessions: &[FeedingEpisode],
    config: &EngineConfig,
) -> Vec<FeedingIntervalStatistics> {
    let mut categories: Vec<FeedCategory> = FeedCategory::STANDARD.to_vec();
    for category in distinct_categories(sessions) {
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    categories
        .iter()
        .map(|category| build_feeding_interval_stats_with_config(sessions, category, config))
        .collect()
}
