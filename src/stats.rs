//! Statistics primitives
//!
//! Small, allocation-light helpers shared by every estimator. All of them
//! accept empty input and return a defined value instead of failing.

use crate::types::IntervalStatistics;

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (Bessel's correction). Zero for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    std_dev_around(values, mean(values))
}

fn std_dev_around(values: &[f64], avg: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Drop values whose absolute z-score exceeds `z_threshold`.
///
/// Single pass: the mean and deviation are computed once over the full input.
/// Inputs with fewer than four values or zero spread are returned unchanged.
pub fn remove_outliers(values: &[f64], z_threshold: f64) -> Vec<f64> {
    if values.len() < 4 {
        return values.to_vec();
    }
    let avg = mean(values);
    let sd = std_dev_around(values, avg);
    if sd == 0.0 {
        return values.to_vec();
    }
    values
        .iter()
        .copied()
        .filter(|v| ((v - avg) / sd).abs() <= z_threshold)
        .collect()
}

/// Exponentially weighted moving average over values ordered oldest first.
///
/// Value `i` of `n` is weighted `alpha * (1 - alpha)^(n - 1 - i)` and the sum is
/// normalised by the total weight, so short series are not biased toward zero.
pub fn ewma(values: &[f64], alpha: f64) -> f64 {
    match values {
        [] => 0.0,
        [only] => *only,
        _ => {
            let n = values.len();
            let mut weight_sum = 0.0;
            let mut weighted_sum = 0.0;
            for (i, value) in values.iter().enumerate() {
                let weight = alpha * (1.0 - alpha).powi((n - 1 - i) as i32);
                weighted_sum += value * weight;
                weight_sum += weight;
            }
            weighted_sum / weight_sum
        }
    }
}

/// Mean, spread and EWMA of already-filtered samples. All zero when empty.
pub fn summarize(samples: &[f64], alpha: f64) -> IntervalStatistics {
    if samples.is_empty() {
        return IntervalStatistics::default();
    }
    let avg = mean(samples);
    IntervalStatistics {
        mean: avg,
        std_dev: std_dev_around(samples, avg),
        weighted_mean: ewma(samples, alpha),
        sample_size: samples.len(),
    }
}
