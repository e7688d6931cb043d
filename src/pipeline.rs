//! Bundle assembly
//!
//! This module provides the public entry points of the engine. It composes
//! the sleep forecast, feeding forecasts and today's insights into one
//! response, either from in-memory episodes or from an [`EventHistory`].

use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::feeding::feeding_interval_summary;
use crate::forecast::{predict_next_feedings_with_config, predict_next_sleep_with_config};
use crate::history::{EventHistory, HistorySnapshot};
use crate::insights::compute_daily_insights_with_config;
use crate::temporal::age_in_weeks;
use crate::types::{
    DailyInsights, FeedingEpisode, FeedingIntervalStatistics, PredictionBundle, SleepEpisode,
    Subject, WakeWindowSummary,
};
use crate::wake_window::wake_window_summary;

/// Build the full prediction bundle with the default configuration.
///
/// # Arguments
/// * `subject` - The infant; only the birth date is used
/// * `sleep_sessions` - Sleep history in any order
/// * `feeding_sessions` - Feeding history in any order
/// * `reference_time` - "Now", in the subject's local offset
pub fn build_predictions(
    subject: &Subject,
    sleep_sessions: &[SleepEpisode],
    feeding_sessions: &[FeedingEpisode],
    reference_time: &DateTime<FixedOffset>,
) -> PredictionBundle {
    build_predictions_with_config(
        subject,
        sleep_sessions,
        feeding_sessions,
        reference_time,
        &EngineConfig::default(),
    )
}

/// Build the full prediction bundle.
///
/// Each part is computed independently: an empty sleep forecast or no feeding
/// predictions leave the rest of the bundle populated.
pub fn build_predictions_with_config(
    subject: &Subject,
    sleep_sessions: &[SleepEpisode],
    feeding_sessions: &[FeedingEpisode],
    reference_time: &DateTime<FixedOffset>,
    config: &EngineConfig,
) -> PredictionBundle {
    let sleep = predict_next_sleep_with_config(subject, sleep_sessions, reference_time, config);
    let feeding = predict_next_feedings_with_config(subject, feeding_sessions, config);
    let insights = compute_daily_insights_with_config(
        reference_time.date_naive(),
        sleep_sessions,
        feeding_sessions,
        config,
    );
    let age_weeks = age_in_weeks(subject.birth_date, reference_time);

    debug!(
        subject_id = %subject.id,
        sleep_episodes = sleep_sessions.len(),
        feeding_episodes = feeding_sessions.len(),
        has_sleep_prediction = sleep.is_some(),
        feeding_predictions = feeding.len(),
        age_weeks,
        "built prediction bundle"
    );

    PredictionBundle {
        sleep,
        feeding,
        insights,
        age_weeks,
    }
}

/// Engine bound to one configuration.
///
/// Holds no state besides the configuration; every call recomputes from the
/// episodes it is given.
#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    config: EngineConfig,
}

impl PredictionEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create an engine from a JSON configuration
    pub fn from_config_json(json: &str) -> Result<Self, EngineError> {
        Ok(Self {
            config: EngineConfig::from_json(json)?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full bundle from in-memory episodes
    pub fn build_predictions(
        &self,
        subject: &Subject,
        sleep_sessions: &[SleepEpisode],
        feeding_sessions: &[FeedingEpisode],
        reference_time: &DateTime<FixedOffset>,
    ) -> PredictionBundle {
        build_predictions_with_config(
            subject,
            sleep_sessions,
            feeding_sessions,
            reference_time,
            &self.config,
        )
    }

    /// Day and night wake-window statistics
    pub fn wake_window_summary(&self, sleep_sessions: &[SleepEpisode]) -> WakeWindowSummary {
        wake_window_summary(sleep_sessions, &self.config)
    }

    /// Interval statistics for every standard and observed feed category
    pub fn feeding_interval_summary(
        &self,
        feeding_sessions: &[FeedingEpisode],
    ) -> Vec<FeedingIntervalStatistics> {
        feeding_interval_summary(feeding_sessions, &self.config)
    }

    /// Insights for any calendar date
    pub fn daily_insights(
        &self,
        date: NaiveDate,
        sleep_sessions: &[SleepEpisode],
        feeding_sessions: &[FeedingEpisode],
    ) -> DailyInsights {
        compute_daily_insights_with_config(date, sleep_sessions, feeding_sessions, &self.config)
    }

    /// Fetch a subject's recent history and build the bundle.
    ///
    /// Only events from the last `history_days` days before `reference_time`
    /// are requested from the store.
    pub fn predict_for_subject(
        &self,
        history: &dyn EventHistory,
        subject_id: Uuid,
        reference_time: &DateTime<FixedOffset>,
    ) -> Result<PredictionBundle, EngineError> {
        let subject = history.subject(subject_id)?;
        let since = self.config.history_start(reference_time)?;

        let sleep_sessions = history.sleep_episodes(subject_id, Some(since))?;
        let feeding_sessions = history.feeding_episodes(subject_id, Some(since))?;

        info!(
            subject_id = %subject_id,
            since = %since.to_rfc3339(),
            sleep_episodes = sleep_sessions.len(),
            feeding_episodes = feeding_sessions.len(),
            "predicting from event history"
        );

        Ok(self.build_predictions(&subject, &sleep_sessions, &feeding_sessions, reference_time))
    }
}

/// Parse an RFC 3339 timestamp such as `2024-03-11T14:10:00+01:00`
pub fn parse_reference_time(value: &str) -> Result<DateTime<FixedOffset>, EngineError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| EngineError::DateParseError(format!("{value}: {e}")))
}

/// Parse a calendar date such as `2024-03-11`
pub fn parse_date(value: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| EngineError::DateParseError(format!("{value}: {e}")))
}

/// Parse a subject identifier
pub fn parse_subject_id(value: &str) -> Result<Uuid, EngineError> {
    Uuid::parse_str(value).map_err(|e| EngineError::ParseError(format!("subject id {value}: {e}")))
}

/// Build a prediction bundle from a JSON history snapshot and return it as JSON.
///
/// The snapshot is validated first; malformed histories are rejected.
pub fn predictions_json(
    snapshot_json: &str,
    subject_id: &str,
    reference_time: &str,
) -> Result<String, EngineError> {
    let snapshot = HistorySnapshot::from_json(snapshot_json)?;
    snapshot.validate()?;
    let subject_id = parse_subject_id(subject_id)?;
    let reference_time = parse_reference_time(reference_time)?;

    let bundle = PredictionEngine::new().predict_for_subject(&snapshot, subject_id, &reference_time)?;
    Ok(serde_json::to_string(&bundle)?)
}

/// Day and night wake-window statistics for a JSON array of sleep episodes
pub fn wake_window_stats_json(sleep_json: &str) -> Result<String, EngineError> {
    let sessions: Vec<SleepEpisode> = serde_json::from_str(sleep_json)?;
    let summary = PredictionEngine::new().wake_window_summary(&sessions);
    Ok(serde_json::to_string(&summary)?)
}

/// Feeding-interval statistics for a JSON array of feeding episodes
pub fn feeding_interval_stats_json(feeding_json: &str) -> Result<String, EngineError> {
    let sessions: Vec<FeedingEpisode> = serde_json::from_str(feeding_json)?;
    let summary = PredictionEngine::new().feeding_interval_summary(&sessions);
    Ok(serde_json::to_string(&summary)?)
}

/// Daily insights for `date` from JSON arrays of sleep and feeding episodes
pub fn daily_insights_json(
    date: &str,
    sleep_json: &str,
    feeding_json: &str,
) -> Result<String, EngineError> {
    let date = parse_date(date)?;
    let sleep: Vec<SleepEpisode> = serde_json::from_str(sleep_json)?;
    let feeding: Vec<FeedingEpisode> = serde_json::from_str(feeding_json)?;
    let insights = PredictionEngine::new().daily_insights(date, &sleep, &feeding);
    Ok(serde_json::to_string(&insights)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, feed, nap, night, sleep, subject, subject_id};
    use crate::types::{Cluster, FeedCategory, SleepCategory};
    use pretty_assertions::assert_eq;

    fn history() -> HistorySnapshot {
        HistorySnapshot {
            subjects: vec![subject("2024-01-01")],
            sleep: vec![
                // Far outside the 30 day window
                nap("2024-01-20T09:00:00+00:00", "2024-01-20T10:00:00+00:00"),
                night("2024-03-10T20:00:00+00:00", "2024-03-10T22:00:00+00:00"),
                night("2024-03-10T23:40:00+00:00", "2024-03-11T01:40:00+00:00"),
                night("2024-03-11T03:25:00+00:00", "2024-03-11T05:00:00+00:00"),
                nap("2024-03-11T08:00:00+00:00", "2024-03-11T08:45:00+00:00"),
            ],
            feeding: vec![
                feed("2024-03-11T05:10:00+00:00", FeedCategory::Breast),
                feed("2024-03-11T08:10:00+00:00", FeedCategory::Breast),
                feed("2024-03-11T11:10:00+00:00", FeedCategory::Breast),
            ],
        }
    }

    #[test]
    fn test_bundle_populates_every_part() {
        let snapshot = history();
        let baby = subject("2024-01-01");
        let now = at("2024-03-11T10:00:00+00:00");
        let bundle = build_predictions(&baby, &snapshot.sleep, &snapshot.feeding, &now);

        assert_eq!(bundle.age_weeks, 10);
        let sleep = bundle.sleep.unwrap();
        assert_eq!(sleep.cluster, Cluster::Day);
        assert_eq!(sleep.predicted_sleep_time, at("2024-03-11T10:00:00+00:00"));
        assert_eq!(bundle.feeding.len(), 1);
        assert_eq!(bundle.feeding[0].predicted_next_feed_time, at("2024-03-11T14:10:00+00:00"));
        assert_eq!(bundle.insights.date, now.date_naive());
        assert_eq!(bundle.insights.nap_count, 1);
        assert_eq!(bundle.insights.feed_count, 3);
    }

    #[test]
    fn test_empty_parts_do_not_block_others() {
        let baby = subject("2024-01-01");
        let now = at("2024-03-11T10:00:00+00:00");
        let sleeps = vec![sleep("2024-03-11T09:30:00+00:00", None, SleepCategory::Nap)];
        let bundle = build_predictions(&baby, &sleeps, &[], &now);

        assert_eq!(bundle.sleep, None);
        assert!(bundle.feeding.is_empty());
        assert_eq!(bundle.insights, DailyInsights::empty(now.date_naive()));
        assert_eq!(bundle.age_weeks, 10);
    }

    #[test]
    fn test_predict_for_subject_applies_history_window() {
        let snapshot = history();
        let now = at("2024-03-11T10:00:00+00:00");
        let engine = PredictionEngine::new();
        let from_history = engine.predict_for_subject(&snapshot, subject_id(), &now).unwrap();

        let recent: Vec<SleepEpisode> = snapshot.sleep[1..].to_vec();
        let direct = engine.build_predictions(&subject("2024-01-01"), &recent, &snapshot.feeding, &now);
        assert_eq!(from_history, direct);
    }

    #[test]
    fn test_predict_for_unknown_subject() {
        let result = PredictionEngine::new().predict_for_subject(
            &history(),
            Uuid::from_u128(1),
            &at("2024-03-11T10:00:00+00:00"),
        );
        assert!(matches!(result, Err(EngineError::SubjectNotFound(_))));
    }

    #[test]
    fn test_oversized_history_window_is_an_error() {
        assert!(PredictionEngine::from_config_json(r#"{"history_days": 100000000}"#).is_err());

        let engine = PredictionEngine {
            config: EngineConfig {
                history_days: 100_000_000,
                ..Default::default()
            },
        };
        let result =
            engine.predict_for_subject(&history(), subject_id(), &at("2024-03-11T10:00:00+00:00"));
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = EngineConfig {
            ewma_alpha: 1.5,
            ..Default::default()
        };
        assert!(PredictionEngine::with_config(config).is_err());
        assert!(PredictionEngine::from_config_json(r#"{"lookback": 1}"#).is_err());
    }

    #[test]
    fn test_predictions_json() {
        let snapshot = history().to_json().unwrap();
        let output = predictions_json(
            &snapshot,
            &subject_id().to_string(),
            "2024-03-11T10:00:00+00:00",
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["age_weeks"], 10);
        assert_eq!(value["sleep"]["cluster"], "day");
        assert_eq!(value["feeding"][0]["feed_category"], "breast");
        assert_eq!(value["insights"]["date"], "2024-03-11");
    }

    #[test]
    fn test_predictions_json_bad_inputs() {
        let snapshot = history().to_json().unwrap();
        assert!(matches!(
            predictions_json(&snapshot, "not-a-uuid", "2024-03-11T10:00:00+00:00"),
            Err(EngineError::ParseError(_))
        ));
        assert!(matches!(
            predictions_json(&snapshot, &subject_id().to_string(), "yesterday"),
            Err(EngineError::DateParseError(_))
        ));
        assert!(matches!(
            predictions_json("{", &subject_id().to_string(), "2024-03-11T10:00:00+00:00"),
            Err(EngineError::JsonError(_))
        ));
    }

    #[test]
    fn test_component_json_helpers() {
        let snapshot = history();
        let sleep_json = serde_json::to_string(&snapshot.sleep).unwrap();
        let feeding_json = serde_json::to_string(&snapshot.feeding).unwrap();

        let wake: serde_json::Value =
            serde_json::from_str(&wake_window_stats_json(&sleep_json).unwrap()).unwrap();
        assert_eq!(wake["night"]["sample_size"], 2);
        assert_eq!(wake["day"]["sample_size"], 0);

        let feeding: serde_json::Value =
            serde_json::from_str(&feeding_interval_stats_json(&feeding_json).unwrap()).unwrap();
        assert_eq!(feeding[0]["feed_category"], "breast");
        assert_eq!(feeding[0]["sample_size"], 2);
        assert_eq!(feeding[1]["sample_size"], 0);

        let insights: serde_json::Value = serde_json::from_str(
            &daily_insights_json("2024-03-11", &sleep_json, &feeding_json).unwrap(),
        )
        .unwrap();
        assert_eq!(insights["feed_count"], 3);
        assert!(daily_insights_json("11/03/2024", &sleep_json, &feeding_json).is_err());
    }

    #[test]
    fn test_bundle_idempotent() {
        let snapshot = history();
        let baby = subject("2024-01-01");
        let now = at("2024-03-11T10:00:00+00:00");
        let first = build_predictions(&baby, &snapshot.sleep, &snapshot.feeding, &now);
        let second = build_predictions(&baby, &snapshot.sleep, &snapshot.feeding, &now);
        assert_eq!(first, second);
    }
}
