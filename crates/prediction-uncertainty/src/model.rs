//! Shared fit/predict/uncertainty contract and input-validation plumbing
//! used by both the classifier and regressor variants.

use nalgebra::DVector;

use trust_core::{Dataset, TrustError, TrustResult};

/// Common contract of prediction-uncertainty models.
///
/// `fit` consumes a calibration dataset held out from the wrapped model's
/// training data; querying before a successful `fit` fails with
/// [`TrustError::NotFitted`]. `uncertainty` never reads the query dataset's
/// target: ground truth is only consumed at calibration time.
pub trait UncertaintyModel {
    fn fit(&mut self, calibration: &Dataset) -> TrustResult<()>;

    /// Point predictions of the wrapped model, one per input row.
    fn predict(&self, data: &Dataset) -> TrustResult<DVector<f64>>;

    /// Non-negative per-row uncertainty scores: higher means the prediction
    /// is expected to be less accurate.
    fn uncertainty(&self, data: &Dataset) -> TrustResult<DVector<f64>>;

    fn is_fitted(&self) -> bool;
}

pub(crate) fn check_calibration_set(calibration: &Dataset) -> TrustResult<()> {
    if calibration.is_empty() {
        return Err(TrustError::Configuration(
            "calibration dataset is empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn not_fitted<T>(what: &str) -> TrustResult<T> {
    Err(TrustError::NotFitted(format!(
        "{what} has not been fitted; call fit() first"
    )))
}

pub(crate) fn check_query(n_features: usize, data: &Dataset) -> TrustResult<()> {
    if data.n_features() != n_features {
        return Err(TrustError::InvalidData(format!(
            "query has {} features, model was calibrated on {}",
            data.n_features(),
            n_features
        )));
    }
    Ok(())
}
