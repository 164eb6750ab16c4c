//! Numeric helpers shared across report and uncertainty crates. All pure
//! functions over slices, no global state.

use crate::error::{TrustError, TrustResult};

/// Round to five significant decimal digits, the display precision applied to
/// every scalar a report emits.
pub fn f5(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor();
    let factor = 10f64.powf(4.0 - magnitude);
    (value * factor).round() / factor
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], q: f64) -> TrustResult<f64> {
    if values.is_empty() {
        return Err(TrustError::InsufficientData(
            "cannot take percentile of an empty slice".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&q) {
        return Err(TrustError::Configuration(format!(
            "percentile {q} outside [0, 100]"
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median over the distinct values of a slice. Used as the split threshold
/// when validating that an uncertainty signal is discriminative.
pub fn median_of_unique(values: &[f64]) -> TrustResult<f64> {
    let mut unique = values.to_vec();
    unique.sort_unstable_by(f64::total_cmp);
    unique.dedup();
    percentile(&unique, 50.0)
}
