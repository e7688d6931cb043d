//! Event history
//!
//! The engine never talks to storage. Callers hand it snapshots through the
//! [`EventHistory`] trait; [`HistorySnapshot`] is the in-memory version used by
//! the CLI, the FFI layer and tests. Validation helpers let a caller reject
//! malformed histories before asking for predictions.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::EngineError;
use crate::temporal::minutes_between;
use crate::types::{FeedingEpisode, SleepEpisode, Subject};

/// Source of subjects and their logged events
pub trait EventHistory {
    /// Look up a subject
    fn subject(&self, id: Uuid) -> Result<Subject, EngineError>;

    /// Sleep episodes for a subject, optionally only those starting at or after `since`
    fn sleep_episodes(
        &self,
        subject_id: Uuid,
        since: Option<DateTime<FixedOffset>>,
    ) -> Result<Vec<SleepEpisode>, EngineError>;

    /// Feeding episodes for a subject, optionally only those starting at or after `since`
    fn feeding_episodes(
        &self,
        subject_id: Uuid,
        since: Option<DateTime<FixedOffset>>,
    ) -> Result<Vec<FeedingEpisode>, EngineError>;
}

/// A serialisable, in-memory event history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub sleep: Vec<SleepEpisode>,
    #[serde(default)]
    pub feeding: Vec<FeedingEpisode>,
}

impl HistorySnapshot {
    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the snapshot to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Check every episode invariant the engine relies on
    pub fn validate(&self) -> Result<(), EngineError> {
        let known: HashSet<Uuid> = self.subjects.iter().map(|s| s.id).collect();
        if let Some(orphan) = self
            .sleep
            .iter()
            .map(|s| s.subject_id)
            .chain(self.feeding.iter().map(|f| f.subject_id))
            .find(|id| !known.contains(id))
        {
            return Err(EngineError::InvalidHistory(format!(
                "episode references unknown subject {orphan}"
            )));
        }
        validate_sleep_history(&self.sleep)?;
        validate_feeding_history(&self.feeding)
    }
}

impl EventHistory for HistorySnapshot {
    fn subject(&self, id: Uuid) -> Result<Subject, EngineError> {
        self.subjects
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(EngineError::SubjectNotFound(id))
    }

    fn sleep_episodes(
        &self,
        subject_id: Uuid,
        since: Option<DateTime<FixedOffset>>,
    ) -> Result<Vec<SleepEpisode>, EngineError> {
        Ok(self
            .sleep
            .iter()
            .filter(|s| s.subject_id == subject_id)
            .filter(|s| since.map_or(true, |t| s.start_time >= t))
            .cloned()
            .collect())
    }

    fn feeding_episodes(
        &self,
        subject_id: Uuid,
        since: Option<DateTime<FixedOffset>>,
    ) -> Result<Vec<FeedingEpisode>, EngineError> {
        Ok(self
            .feeding
            .iter()
            .filter(|f| f.subject_id == subject_id)
            .filter(|f| since.map_or(true, |t| f.start_time >= t))
            .cloned()
            .collect())
    }
}

/// At most one open sleep per subject, end after start, and a duration
/// matching the recorded times in whole minutes
pub fn validate_sleep_history(sessions: &[SleepEpisode]) -> Result<(), EngineError> {
    let mut open: HashSet<Uuid> = HashSet::new();

    for session in sessions {
        match (session.end_time, session.duration_minutes) {
            (None, None) => {
                if !open.insert(session.subject_id) {
                    return Err(EngineError::InvalidHistory(format!(
                        "subject {} has more than one open sleep episode",
                        session.subject_id
                    )));
                }
            }
            (None, Some(_)) => {
                return Err(EngineError::InvalidHistory(format!(
                    "sleep episode {} has a duration but no end time",
                    session.id
                )));
            }
            (Some(_), None) => {
                return Err(EngineError::InvalidHistory(format!(
                    "sleep episode {} has an end time but no duration",
                    session.id
                )));
            }
            (Some(end), Some(duration)) => {
                let elapsed = minutes_between(&session.start_time, &end);
                if elapsed < 0.0 {
                    return Err(EngineError::InvalidHistory(format!(
                        "sleep episode {} ends before it starts",
                        session.id
                    )));
                }
                if elapsed.floor() as u32 != duration {
                    return Err(EngineError::InvalidHistory(format!(
                        "sleep episode {} records {duration} minutes but spans {elapsed:.1}",
                        session.id
                    )));
                }
            }
        }
    }

    Ok(())
}

/// At most one open feed per subject, and no feed ending before it starts
pub fn validate_feeding_history(sessions: &[FeedingEpisode]) -> Result<(), EngineError> {
    let mut open: HashSet<Uuid> = HashSet::new();

    for session in sessions {
        match session.end_time {
            None => {
                if !open.insert(session.subject_id) {
                    return Err(EngineError::InvalidHistory(format!(
                        "subject {} has more than one open feeding episode",
                        session.subject_id
                    )));
                }
            }
            Some(end) if end < session.start_time => {
                return Err(EngineError::InvalidHistory(format!(
                    "feeding episode {} ends before it starts",
                    session.id
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, feed, nap, sleep, subject, subject_id};
    use crate::types::{FeedCategory, SleepCategory};

    fn snapshot() -> HistorySnapshot {
        HistorySnapshot {
            subjects: vec![subject("2024-01-01")],
            sleep: vec![
                nap("2024-02-01T09:00:00+00:00", "2024-02-01T10:00:00+00:00"),
                nap("2024-03-11T09:00:00+00:00", "2024-03-11T10:00:00+00:00"),
            ],
            feeding: vec![
                feed("2024-02-01T08:00:00+00:00", FeedCategory::Breast),
                feed("2024-03-11T08:00:00+00:00", FeedCategory::Breast),
            ],
        }
    }

    #[test]
    fn test_lookup_and_since_filter() {
        let history = snapshot();
        assert_eq!(history.subject(subject_id()).unwrap().name, "Ada");

        let since = Some(at("2024-03-01T00:00:00+00:00"));
        assert_eq!(history.sleep_episodes(subject_id(), since).unwrap().len(), 1);
        assert_eq!(history.feeding_episodes(subject_id(), since).unwrap().len(), 1);
        assert_eq!(history.sleep_episodes(subject_id(), None).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_subject() {
        let missing = Uuid::from_u128(7);
        let result = snapshot().subject(missing);
        assert!(matches!(result, Err(EngineError::SubjectNotFound(id)) if id == missing));
        assert!(snapshot().sleep_episodes(missing, None).unwrap().is_empty());
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(snapshot().validate().is_ok());
    }

    #[test]
    fn test_two_open_sleeps_rejected() {
        let sessions = vec![
            sleep("2024-03-11T09:00:00+00:00", None, SleepCategory::Nap),
            sleep("2024-03-11T13:00:00+00:00", None, SleepCategory::Nap),
        ];
        assert!(matches!(
            validate_sleep_history(&sessions),
            Err(EngineError::InvalidHistory(_))
        ));
    }

    #[test]
    fn test_inconsistent_duration_rejected() {
        let mut episode = nap("2024-03-11T09:00:00+00:00", "2024-03-11T10:00:00+00:00");
        episode.duration_minutes = Some(45);
        assert!(validate_sleep_history(&[episode.clone()]).is_err());

        episode.duration_minutes = None;
        assert!(validate_sleep_history(&[episode]).is_err());
    }

    #[test]
    fn test_backwards_sleep_rejected() {
        let mut episode = nap("2024-03-11T09:00:00+00:00", "2024-03-11T10:00:00+00:00");
        episode.end_time = Some(at("2024-03-11T08:00:00+00:00"));
        assert!(validate_sleep_history(&[episode]).is_err());
    }

    #[test]
    fn test_two_open_feeds_rejected() {
        let mut first = feed("2024-03-11T09:00:00+00:00", FeedCategory::Bottle);
        let mut second = feed("2024-03-11T11:00:00+00:00", FeedCategory::Bottle);
        first.end_time = None;
        second.end_time = None;
        assert!(validate_feeding_history(&[first.clone()]).is_ok());
        assert!(validate_feeding_history(&[first, second]).is_err());
    }

    #[test]
    fn test_orphan_episode_rejected() {
        let mut history = snapshot();
        history.sleep[0].subject_id = Uuid::from_u128(99);
        assert!(history.validate().is_err());
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "subjects": [{"id": "00000000-0000-0000-0000-0000000000aa", "name": "Ada", "birth_date": "2024-01-01"}],
            "sleep": [{
                "id": "00000000-0000-0000-0000-000000000001",
                "subject_id": "00000000-0000-0000-0000-0000000000aa",
                "start_time": "2024-03-11T09:00:00+01:00",
                "end_time": "2024-03-11T10:30:00+01:00",
                "duration_minutes": 90,
                "category": "nap"
            }],
            "feeding": [{
                "id": "00000000-0000-0000-0000-000000000002",
                "subject_id": "00000000-0000-0000-0000-0000000000aa",
                "start_time": "2024-03-11T08:00:00+01:00",
                "feed_category": "bottle",
                "quantity": 120.0,
                "quantity_unit": "ml"
            }]
        }"#;
        let history = HistorySnapshot::from_json(json).unwrap();
        assert!(history.validate().is_ok());
        assert_eq!(history.sleep[0].duration_minutes, Some(90));
        assert_eq!(history.feeding[0].feed_category, FeedCategory::Bottle);
        assert!(history.feeding[0].is_open());
    }
}
