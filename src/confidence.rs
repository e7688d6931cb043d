//! Confidence scoring
//!
//! Maps the coefficient of variation of a sample list onto [0, 1], with a small
//! bonus for larger samples. Too few samples always score low.

use crate::config::{DEFAULT_LOOKBACK, DEFAULT_MIN_SAMPLES};
use crate::stats::std_dev;

/// Score returned when there are fewer samples than the minimum
pub const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.3;

/// Score returned when the estimate being scored is zero
pub const ZERO_ESTIMATE_CONFIDENCE: f64 = 0.5;

const CONFIDENCE_FLOOR: f64 = 0.1;
const MAX_SAMPLE_BONUS: f64 = 0.1;

/// Confidence of `weighted_mean` given its samples, with default thresholds
pub fn confidence_from_variance(samples: &[f64], weighted_mean: f64) -> f64 {
    confidence_with_thresholds(samples, weighted_mean, DEFAULT_MIN_SAMPLES, DEFAULT_LOOKBACK)
}

/// Confidence of `weighted_mean` given its samples.
///
/// `full_sample` is the sample count that earns the whole size bonus.
pub fn confidence_with_thresholds(
    samples: &[f64],
    weighted_mean: f64,
    min_samples: usize,
    full_sample: usize,
) -> f64 {
    if samples.len() < min_samples {
        return INSUFFICIENT_DATA_CONFIDENCE;
    }
    if weighted_mean == 0.0 {
        return ZERO_ESTIMATE_CONFIDENCE;
    }

    // CV of 0 scores 1.0, CV of 1 scores ~0.33
    let cv = std_dev(samples) / weighted_mean;
    let base = (1.0 / (1.0 + 2.0 * cv)).clamp(CONFIDENCE_FLOOR, 1.0);

    let fill = (samples.len() as f64 / full_sample.max(1) as f64).min(1.0);
    (base + MAX_SAMPLE_BONUS * fill).clamp(0.0, 1.0)
}
