//! Age-appropriate wake windows
//!
//! Reference ranges derived from pediatric sleep norms. The forecaster blends
//! the typical value with observed wake windows and falls back to it entirely
//! when there is too little history.

use serde::Serialize;

/// Expected wake-window range for an age band, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeBand {
    /// Oldest age (weeks, inclusive) covered by this band; `None` is unbounded
    pub max_weeks: Option<u32>,
    pub min_minutes: u32,
    pub max_minutes: u32,
    pub typical_minutes: u32,
}

impl AgeBand {
    const fn new(max_weeks: Option<u32>, min: u32, max: u32, typical: u32) -> Self {
        Self {
            max_weeks,
            min_minutes: min,
            max_minutes: max,
            typical_minutes: typical,
        }
    }

    /// Whether an age in weeks falls at or below this band's upper bound
    pub fn covers(&self, weeks: u32) -> bool {
        self.max_weeks.map_or(true, |max| weeks <= max)
    }

    /// Whether a wake window lies inside the expected range
    pub fn contains(&self, minutes: f64) -> bool {
        minutes >= self.min_minutes as f64 && minutes <= self.max_minutes as f64
    }
}

/// Bands ordered by age; the last one catches everything older
pub const AGE_WAKE_WINDOWS: [AgeBand; 8] = [
    AgeBand::new(Some(6), 45, 60, 50),
    AgeBand::new(Some(12), 60, 90, 75),
    AgeBand::new(Some(20), 75, 120, 100),
    AgeBand::new(Some(32), 90, 150, 120),
    AgeBand::new(Some(52), 120, 180, 150),
    AgeBand::new(Some(78), 150, 240, 195),
    AgeBand::new(Some(104), 180, 300, 240),
    AgeBand::new(None, 240, 360, 300),
];

/// First band whose upper bound is at or above `weeks`
pub fn band_for_age(weeks: u32) -> &'static AgeBand {
    AGE_WAKE_WINDOWS
        .iter()
        .find(|band| band.covers(weeks))
        .unwrap_or(&AGE_WAKE_WINDOWS[AGE_WAKE_WINDOWS.len() - 1])
}
