//! Napper Engine - Deterministic prediction engine for infant sleep and feeding
//!
//! The engine turns logged sleep and feeding episodes into forecasts and daily
//! summaries through a pure pipeline: statistics primitives → temporal
//! classification → per-cluster and per-category interval estimates →
//! confidence scoring → forecasts. Daily insights are computed alongside from
//! the same history.
//!
//! Nothing here performs I/O or reads the clock. Callers pass a reference
//! time, and identical inputs always produce identical outputs.
//!
//! ## Entry points
//!
//! - [`build_predictions`]: sleep forecast, feeding forecasts, today's insights and age
//! - [`build_wake_window_stats`]: wake-window statistics for the day or night cluster
//! - [`build_feeding_interval_stats`]: interval statistics for one feed category
//! - [`compute_daily_insights`]: literal aggregates for one calendar date

pub mod age;
pub mod config;
pub mod confidence;
pub mod error;
pub mod feeding;
pub mod forecast;
pub mod history;
pub mod insights;
pub mod pipeline;
pub mod stats;
pub mod temporal;
pub mod types;
pub mod wake_window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

#[cfg(test)]
mod fixtures;

pub use config::{ConfidenceSource, EngineConfig};
pub use error::EngineError;
pub use feeding::build_feeding_interval_stats;
pub use forecast::{predict_next_feedings, predict_next_sleep};
pub use history::{EventHistory, HistorySnapshot};
pub use insights::compute_daily_insights;
pub use pipeline::{build_predictions, PredictionEngine};
pub use types::{
    Cluster, DailyInsights, FeedCategory, FeedingEpisode, FeedingIntervalStatistics,
    FeedingPrediction, IntervalStatistics, PredictionBundle, SleepCategory, SleepEpisode,
    SleepPrediction, Subject, WakeWindowSummary,
};
pub use wake_window::build_wake_window_stats;

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
