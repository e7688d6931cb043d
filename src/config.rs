//! Engine configuration
//!
//! Every tunable constant of the estimators lives here. The defaults are the
//! values the engine ships with; callers may override any subset from JSON.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Exponential smoothing factor. Higher puts more weight on recent data.
pub const DEFAULT_EWMA_ALPHA: f64 = 0.35;

/// Z-score above which an interval is treated as an outlier
pub const DEFAULT_OUTLIER_Z_THRESHOLD: f64 = 2.5;

/// Maximum number of most recent episodes used by a rolling statistic
pub const DEFAULT_LOOKBACK: usize = 14;

/// Minimum samples before observed data outweighs the age reference
pub const DEFAULT_MIN_SAMPLES: usize = 3;

/// First hour (inclusive) of the day cluster
pub const DEFAULT_DAY_START_HOUR: u32 = 6;

/// First hour (inclusive) of the night cluster
pub const DEFAULT_NIGHT_START_HOUR: u32 = 20;

/// Days of history fetched from the event store per prediction request
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Upper limit on `history_days`, roughly ten years
pub const MAX_HISTORY_DAYS: i64 = 3650;

/// Which sample list feeds the sleep forecast's confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// The weighted mean repeated once per observed wake window
    SyntheticSamples,
    /// The filtered wake windows themselves
    ObservedGaps,
}

/// Inclusive range of plausible interval lengths, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinuteBounds {
    pub min: f64,
    pub max: f64,
}

impl MinuteBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, minutes: f64) -> bool {
        minutes >= self.min && minutes <= self.max
    }
}

/// Tunables for the statistical pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ewma_alpha: f64,
    pub outlier_z_threshold: f64,
    pub lookback: usize,
    pub min_samples_for_prediction: usize,
    pub day_start_hour: u32,
    pub night_start_hour: u32,
    /// Physiologically plausible wake windows
    pub wake_window_bounds: MinuteBounds,
    /// Physiologically plausible feeding intervals
    pub feeding_interval_bounds: MinuteBounds,
    /// Weight of the observed wake window against the age reference
    pub observed_weight: f64,
    pub history_days: i64,
    pub confidence_source: ConfidenceSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ewma_alpha: DEFAULT_EWMA_ALPHA,
            outlier_z_threshold: DEFAULT_OUTLIER_Z_THRESHOLD,
            lookback: DEFAULT_LOOKBACK,
            min_samples_for_prediction: DEFAULT_MIN_SAMPLES,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            night_start_hour: DEFAULT_NIGHT_START_HOUR,
            wake_window_bounds: MinuteBounds::new(15.0, 480.0),
            feeding_interval_bounds: MinuteBounds::new(30.0, 360.0),
            observed_weight: 0.7,
            history_days: DEFAULT_HISTORY_DAYS,
            confidence_source: ConfidenceSource::SyntheticSamples,
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Check that every tunable is inside its meaningful range
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.ewma_alpha > 0.0 && self.ewma_alpha <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "ewma_alpha must be in (0, 1], got {}",
                self.ewma_alpha
            )));
        }
        if !(self.outlier_z_threshold > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "outlier_z_threshold must be positive, got {}",
                self.outlier_z_threshold
            )));
        }
        if self.lookback < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "lookback must be at least 2 episodes, got {}",
                self.lookback
            )));
        }
        if self.day_start_hour >= self.night_start_hour || self.night_start_hour > 23 {
            return Err(EngineError::InvalidConfig(format!(
                "day/night hours must satisfy day_start < night_start <= 23, got {}..{}",
                self.day_start_hour, self.night_start_hour
            )));
        }
        for (name, bounds) in [
            ("wake_window_bounds", self.wake_window_bounds),
            ("feeding_interval_bounds", self.feeding_interval_bounds),
        ] {
            if !(bounds.min >= 0.0 && bounds.min <= bounds.max) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must satisfy 0 <= min <= max, got [{}, {}]",
                    bounds.min, bounds.max
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.observed_weight) {
            return Err(EngineError::InvalidConfig(format!(
                "observed_weight must be in [0, 1], got {}",
                self.observed_weight
            )));
        }
        if !(1..=MAX_HISTORY_DAYS).contains(&self.history_days) {
            return Err(EngineError::InvalidConfig(format!(
                "history_days must be in [1, {MAX_HISTORY_DAYS}], got {}",
                self.history_days
            )));
        }
        Ok(())
    }

    /// Earliest event start fetched for a prediction at `reference_time`
    pub fn history_start(
        &self,
        reference_time: &DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>, EngineError> {
        if !(1..=MAX_HISTORY_DAYS).contains(&self.history_days) {
            return Err(EngineError::InvalidConfig(format!(
                "history_days out of range: {}",
                self.history_days
            )));
        }
        reference_time
            .checked_sub_signed(Duration::days(self.history_days))
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "history window of {} days underflows {}",
                    self.history_days,
                    reference_time.to_rfc3339()
                ))
            })
    }
}
