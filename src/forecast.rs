//! Forecasters
//!
//! Next-sleep and next-feed predictions built from the interval estimators,
//! the age reference table and the confidence scorer. "Now" is always passed
//! in by the caller.

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::age::band_for_age;
use crate::config::{ConfidenceSource, EngineConfig};
use crate::confidence::confidence_with_thresholds;
use crate::feeding::{
    build_feeding_interval_stats_with_config, category_feeds, distinct_categories,
    feeding_intervals,
};
use crate::stats::{ewma, summarize};
use crate::temporal::{age_in_weeks, cluster_with_hours, offset_by_minutes};
use crate::types::{FeedingEpisode, FeedingPrediction, SleepEpisode, SleepPrediction, Subject};
use crate::wake_window::{sorted_by_start, wake_window_samples};

/// Predict the next sleep with the default configuration
pub fn predict_next_sleep(
    subject: &Subject,
    sessions: &[SleepEpisode],
    reference_time: &DateTime<FixedOffset>,
) -> Option<SleepPrediction> {
    predict_next_sleep_with_config(subject, sessions, reference_time, &EngineConfig::default())
}

/// Predict when the subject will next fall asleep, and for how long.
///
/// Returns `None` with no history, and while the latest episode is still open:
/// there is no wake time to count from until the subject wakes.
pub fn predict_next_sleep_with_config(
    subject: &Subject,
    sessions: &[SleepEpisode],
    reference_time: &DateTime<FixedOffset>,
    config: &EngineConfig,
) -> Option<SleepPrediction> {
    let sorted = sorted_by_start(sessions);
    let last = sorted.last()?;
    let Some(last_wake) = last.end_time else {
        debug!(subject_id = %subject.id, "sleep in progress, no sleep forecast");
        return None;
    };

    let cluster =
        cluster_with_hours(reference_time, config.day_start_hour, config.night_start_hour);
    let samples = wake_window_samples(sessions, cluster, config);
    let stats = summarize(&samples, config.ewma_alpha);

    let weeks = age_in_weeks(subject.birth_date, reference_time);
    let typical = band_for_age(weeks).typical_minutes as f64;

    let wake_window = if stats.sample_size >= config.min_samples_for_prediction {
        config.observed_weight * stats.weighted_mean + (1.0 - config.observed_weight) * typical
    } else {
        debug!(
            subject_id = %subject.id,
            samples = stats.sample_size,
            age_weeks = weeks,
            "too few wake windows, using age reference"
        );
        typical
    };

    let predicted_sleep_time = offset_by_minutes(&last_wake, wake_window);

    let durations: Vec<f64> = sorted
        .iter()
        .filter(|s| {
            cluster_with_hours(&s.start_time, config.day_start_hour, config.night_start_hour)
                == cluster
        })
        .filter_map(|s| s.duration_minutes)
        .map(f64::from)
        .collect();
    let recent_durations = &durations[durations.len().saturating_sub(config.lookback)..];
    let predicted_wake_time = (!recent_durations.is_empty()).then(|| {
        offset_by_minutes(&predicted_sleep_time, ewma(recent_durations, config.ewma_alpha))
    });

    let confidence_samples = match config.confidence_source {
        ConfidenceSource::SyntheticSamples => vec![stats.weighted_mean; stats.sample_size],
        ConfidenceSource::ObservedGaps => samples,
    };
    let confidence = confidence_with_thresholds(
        &confidence_samples,
        wake_window,
        config.min_samples_for_prediction,
        config.lookback,
    );

    Some(SleepPrediction {
        subject_id: subject.id,
        predicted_sleep_time,
        predicted_wake_time,
        wake_window_minutes: wake_window.round() as i64,
        confidence,
        cluster,
        based_on_sessions: stats.sample_size,
    })
}

/// Predict the next feed per category with the default configuration
pub fn predict_next_feedings(subject: &Subject, sessions: &[FeedingEpisode]) -> Vec<FeedingPrediction> {
    predict_next_feedings_with_config(subject, sessions, &EngineConfig::default())
}

/// One prediction per category that has a usable interval estimate, in the
/// order categories first appear in `sessions`.
pub fn predict_next_feedings_with_config(
    subject: &Subject,
    sessions: &[FeedingEpisode],
    config: &EngineConfig,
) -> Vec<FeedingPrediction> {
    let mut predictions = Vec::new();

    for category in distinct_categories(sessions) {
        let stats = build_feeding_interval_stats_with_config(sessions, &category, config).stats;
        if stats.sample_size < 1 || stats.weighted_mean == 0.0 {
            debug!(category = category.as_str(), "no usable feeding interval");
            continue;
        }

        let feeds = category_feeds(sessions, &category);
        let Some(last_feed) = feeds.last() else {
            continue;
        };

        let intervals = feeding_intervals(&feeds, config.feeding_interval_bounds);
        let confidence = confidence_with_thresholds(
            &intervals,
            stats.weighted_mean,
            config.min_samples_for_prediction,
            config.lookback,
        );

        predictions.push(FeedingPrediction {
            subject_id: subject.id,
            predicted_next_feed_time: offset_by_minutes(&last_feed.start_time, stats.weighted_mean),
            average_interval_minutes: stats.weighted_mean.round() as i64,
            feed_category: category,
            confidence,
            based_on_sessions: stats.sample_size,
        });
    }

    predictions
}
