use nalgebra::{DMatrix, DVector};

use crate::error::TrustResult;

/// Point-prediction capability of an externally trained model. The wrapped
/// model is never mutated by this crate; implementations are shared behind
/// `Arc` for the lifetime of the analysis.
pub trait Estimator: Send + Sync {
    /// One prediction per input row.
    fn predict(&self, features: &DMatrix<f64>) -> TrustResult<DVector<f64>>;

    /// Probability capability query. Callers check this once, at fit time,
    /// instead of assuming the capability at every prediction.
    fn probabilistic(&self) -> Option<&dyn ProbabilisticEstimator> {
        None
    }
}

/// Class-probability extension of [`Estimator`] for classification models.
pub trait ProbabilisticEstimator: Estimator {
    /// Per-class probability matrix, one row per sample. Each row sums to 1
    /// and columns follow the order of [`classes`](Self::classes).
    fn predict_probabilities(&self, features: &DMatrix<f64>) -> TrustResult<DMatrix<f64>>;

    /// Class labels in probability-column order.
    fn classes(&self) -> &[f64];
}

/// Factory for training auxiliary sub-models on resampled data.
pub trait EstimatorBuilder: Send + Sync {
    fn fit(&self, features: &DMatrix<f64>, target: &DVector<f64>)
        -> TrustResult<Box<dyn Estimator>>;
}
