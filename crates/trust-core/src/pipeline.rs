//! Mean-imputation pipeline: wraps an estimator (or estimator builder) so
//! that NaN cells are replaced with per-column means learned from a
//! reference matrix before any prediction is made.

use nalgebra::{DMatrix, DVector};

use crate::error::TrustResult;
use crate::estimator::{Estimator, EstimatorBuilder};

/// Per-column means, skipping NaN cells. An all-NaN column imputes to 0.
pub fn column_means(matrix: &DMatrix<f64>) -> Vec<f64> {
    (0..matrix.ncols())
        .map(|col| {
            let mut sum = 0.0;
            let mut count = 0usize;
            for row in 0..matrix.nrows() {
                let v = matrix[(row, col)];
                if v.is_finite() {
                    sum += v;
                    count += 1;
                }
            }
            if count > 0 {
                sum / count as f64
            } else {
                0.0
            }
        })
        .collect()
}

/// Copy of `matrix` with every non-finite cell replaced by the column's
/// imputation value.
pub fn impute(matrix: &DMatrix<f64>, means: &[f64]) -> DMatrix<f64> {
    DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |row, col| {
        let v = matrix[(row, col)];
        if v.is_finite() {
            v
        } else {
            means[col]
        }
    })
}

/// An estimator guarded by mean imputation of its inputs.
pub struct ImputingEstimator {
    inner: Box<dyn Estimator>,
    means: Vec<f64>,
}

impl ImputingEstimator {
    /// Wrap a trained estimator, learning imputation values from `reference`.
    pub fn new(inner: Box<dyn Estimator>, reference: &DMatrix<f64>) -> Self {
        Self {
            means: column_means(reference),
            inner,
        }
    }
}

impl Estimator for ImputingEstimator {
    fn predict(&self, features: &DMatrix<f64>) -> TrustResult<DVector<f64>> {
        let imputed = impute(features, &self.means);
        self.inner.predict(&imputed)
    }
}

/// [`EstimatorBuilder`] composing mean imputation with an inner builder:
/// the training matrix is imputed before the inner fit, and the resulting
/// model keeps imputing at prediction time.
#[derive(Debug, Clone, Default)]
pub struct ImputationPipeline<B> {
    inner: B,
}

impl<B> ImputationPipeline<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

impl<B: EstimatorBuilder> EstimatorBuilder for ImputationPipeline<B> {
    fn fit(
        &self,
        features: &DMatrix<f64>,
        target: &DVector<f64>,
    ) -> TrustResult<Box<dyn Estimator>> {
        let means = column_means(features);
        let imputed = impute(features, &means);
        let model = self.inner.fit(&imputed, target)?;
        Ok(Box::new(ImputingEstimator {
            inner: model,
            means,
        }))
    }
}
