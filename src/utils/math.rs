//! Numeric helpers shared by adapters, the aggregator and health probes.

use rand::Rng;

use crate::utils::constants::MAX_CONFIDENCE;

/// Clamp a confidence score into `[0, 99.9]`. NaN maps to zero.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_CONFIDENCE)
}

/// `base + U(0, spread)`
pub fn jitter(base: f64, spread: f64) -> f64 {
    if spread <= 0.0 {
        return base;
    }
    base + rand::thread_rng().gen_range(0.0..spread)
}

/// `base + U{0, .., spread - 1}`
pub fn jitter_count(base: u32, spread: u32) -> u32 {
    if spread == 0 {
        return base;
    }
    base + rand::thread_rng().gen_range(0..spread)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Relative distance of `value` from `reference` (0.05 = 5%)
pub fn relative_deviation(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return if value == 0.0 { 0.0 } else { f64::INFINITY };
    }
    ((value - reference) / reference).abs()
}

/// Check that every value sits strictly within `tolerance` of the mean
pub fn all_within_tolerance(values: &[f64], tolerance: f64) -> bool {
    match mean(values) {
        Some(avg) => values
            .iter()
            .all(|v| relative_deviation(*v, avg) < tolerance),
        None => false,
    }
}
