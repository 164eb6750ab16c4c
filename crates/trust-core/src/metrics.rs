//! Scoring metrics used to validate that uncertainty signals are
//! discriminative (low-uncertainty subsets should score higher).

use crate::error::{TrustError, TrustResult};

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> TrustResult<()> {
    if y_true.is_empty() {
        return Err(TrustError::InsufficientData(
            "cannot score an empty prediction set".to_string(),
        ));
    }
    if y_true.len() != y_pred.len() {
        return Err(TrustError::InvalidData(format!(
            "{} targets vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    Ok(())
}

/// Unweighted mean of per-class recall, over the classes present in `y_true`.
pub fn macro_recall(y_true: &[f64], y_pred: &[f64]) -> TrustResult<f64> {
    check_lengths(y_true, y_pred)?;

    let mut classes = y_true.to_vec();
    classes.sort_unstable_by(f64::total_cmp);
    classes.dedup();

    let mut recall_sum = 0.0;
    for class in &classes {
        let mut support = 0usize;
        let mut hits = 0usize;
        for (t, p) in y_true.iter().zip(y_pred) {
            if t == class {
                support += 1;
                if p == class {
                    hits += 1;
                }
            }
        }
        recall_sum += hits as f64 / support as f64;
    }
    Ok(recall_sum / classes.len() as f64)
}

/// Coefficient of determination. Fails when the target has zero variance.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> TrustResult<f64> {
    check_lengths(y_true, y_pred)?;

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Err(TrustError::InvalidData(
            "R^2 is undefined for a zero-variance target".to_string(),
        ));
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(1.0 - ss_res / ss_tot)
}
