//! Core types for the Napper engine
//!
//! Event snapshots supplied by the event store, and the ephemeral statistics
//! and predictions the engine derives from them. Timestamps carry the
//! subject's local UTC offset, so "local hour" and "local date" are read
//! straight off each value.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Day/night classification of a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Day,
    Night,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Day => "day",
            Cluster::Night => "night",
        }
    }
}

/// Kind of sleep episode as logged by the caregiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepCategory {
    Nap,
    Night,
}

/// Feed category. The set is open: unknown categories are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedCategory {
    Breast,
    Bottle,
    Solid,
    #[serde(untagged)]
    Other(String),
}

impl FeedCategory {
    /// Categories every caller can expect to exist
    pub const STANDARD: [FeedCategory; 3] =
        [FeedCategory::Breast, FeedCategory::Bottle, FeedCategory::Solid];

    pub fn as_str(&self) -> &str {
        match self {
            FeedCategory::Breast => "breast",
            FeedCategory::Bottle => "bottle",
            FeedCategory::Solid => "solid",
            FeedCategory::Other(name) => name.as_str(),
        }
    }
}

/// Unit of a recorded feed quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityUnit {
    Ml,
    Min,
    G,
}

/// Breast used for a breast feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreastSide {
    Left,
    Right,
    Both,
}

/// The infant whose events are being analysed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    /// Calendar birth date
    pub birth_date: NaiveDate,
}

/// A logged sleep episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEpisode {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub start_time: DateTime<FixedOffset>,
    /// `None` while the subject is still asleep
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    /// Whole minutes between start and end; present iff `end_time` is
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub category: SleepCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SleepEpisode {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A logged feeding episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingEpisode {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub start_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    pub feed_category: FeedCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_unit: Option<QuantityUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<BreastSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FeedingEpisode {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Summary statistics over a list of intervals (minutes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalStatistics {
    pub mean: f64,
    pub std_dev: f64,
    /// Exponentially weighted mean, favouring recent intervals
    pub weighted_mean: f64,
    pub sample_size: usize,
}

/// Interval statistics for one feed category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingIntervalStatistics {
    pub feed_category: FeedCategory,
    #[serde(flatten)]
    pub stats: IntervalStatistics,
}

/// Wake-window statistics for both clusters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WakeWindowSummary {
    pub day: IntervalStatistics,
    pub night: IntervalStatistics,
}

/// Forecast of the next sleep episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPrediction {
    pub subject_id: Uuid,
    pub predicted_sleep_time: DateTime<FixedOffset>,
    pub predicted_wake_time: Option<DateTime<FixedOffset>>,
    /// Blended wake window, rounded to whole minutes
    pub wake_window_minutes: i64,
    /// Confidence (0-1)
    pub confidence: f64,
    pub cluster: Cluster,
    /// Number of wake windows the estimate was based on
    pub based_on_sessions: usize,
}

/// Forecast of the next feed of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingPrediction {
    pub subject_id: Uuid,
    pub predicted_next_feed_time: DateTime<FixedOffset>,
    pub average_interval_minutes: i64,
    pub feed_category: FeedCategory,
    /// Confidence (0-1)
    pub confidence: f64,
    pub based_on_sessions: usize,
}

/// Same-day aggregates, all minute figures rounded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyInsights {
    pub date: NaiveDate,
    pub total_sleep_minutes: i64,
    pub nap_count: usize,
    pub longest_nap_minutes: i64,
    pub average_wake_window_minutes: i64,
    pub feed_count: usize,
    pub night_sleep_minutes: i64,
}

impl DailyInsights {
    /// Insights for a date with nothing logged
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_sleep_minutes: 0,
            nap_count: 0,
            longest_nap_minutes: 0,
            average_wake_window_minutes: 0,
            feed_count: 0,
            night_sleep_minutes: 0,
        }
    }
}

/// Everything a client needs for the home screen in one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBundle {
    pub sleep: Option<SleepPrediction>,
    pub feeding: Vec<FeedingPrediction>,
    pub insights: DailyInsights,
    pub age_weeks: u32,
}
