//! Self-contained k-nearest-neighbour reference estimators. They serve as
//! the default sub-model family for bootstrap ensembles and as wrapped-model
//! stand-ins in tests; any external model implementing the estimator traits
//! can take their place.

use nalgebra::{DMatrix, DVector};

use crate::error::{TrustError, TrustResult};
use crate::estimator::{Estimator, EstimatorBuilder, ProbabilisticEstimator};

fn check_fit_inputs(features: &DMatrix<f64>, target: &DVector<f64>, k: usize) -> TrustResult<()> {
    if k == 0 {
        return Err(TrustError::Configuration(
            "k must be at least 1".to_string(),
        ));
    }
    if features.nrows() == 0 {
        return Err(TrustError::InsufficientData(
            "cannot fit on an empty feature matrix".to_string(),
        ));
    }
    if target.len() != features.nrows() {
        return Err(TrustError::InvalidData(format!(
            "target has {} entries but feature matrix has {} rows",
            target.len(),
            features.nrows()
        )));
    }
    Ok(())
}

fn check_query(n_features: usize, query: &DMatrix<f64>) -> TrustResult<()> {
    if query.ncols() != n_features {
        return Err(TrustError::InvalidData(format!(
            "query has {} columns, model was fitted on {}",
            query.ncols(),
            n_features
        )));
    }
    Ok(())
}

/// Indices of the `k` training rows closest to `query.row(row)`.
fn nearest_indices(train: &DMatrix<f64>, query: &DMatrix<f64>, row: usize, k: usize) -> Vec<usize> {
    let mut dists: Vec<(f64, usize)> = (0..train.nrows())
        .map(|i| {
            let diff = train.row(i) - query.row(row);
            (diff.norm_squared(), i)
        })
        .collect();
    dists.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    dists.truncate(k);
    dists.into_iter().map(|(_, i)| i).collect()
}

/// k-NN regressor: prediction is the mean target of the nearest neighbours.
pub struct KnnRegressor {
    features: DMatrix<f64>,
    target: DVector<f64>,
    k: usize,
}

impl KnnRegressor {
    pub fn fit(features: DMatrix<f64>, target: DVector<f64>, k: usize) -> TrustResult<Self> {
        check_fit_inputs(&features, &target, k)?;
        // k capped at the training size
        let k = k.min(features.nrows());
        Ok(Self {
            features,
            target,
            k,
        })
    }
}

impl Estimator for KnnRegressor {
    fn predict(&self, features: &DMatrix<f64>) -> TrustResult<DVector<f64>> {
        check_query(self.features.ncols(), features)?;

        let predictions = (0..features.nrows()).map(|row| {
            let neighbours = nearest_indices(&self.features, features, row, self.k);
            let sum: f64 = neighbours.iter().map(|&i| self.target[i]).sum();
            sum / neighbours.len() as f64
        });
        Ok(DVector::from_iterator(features.nrows(), predictions))
    }
}

/// k-NN classifier with vote-fraction class probabilities.
pub struct KnnClassifier {
    features: DMatrix<f64>,
    target: DVector<f64>,
    classes: Vec<f64>,
    k: usize,
}

impl KnnClassifier {
    pub fn fit(features: DMatrix<f64>, target: DVector<f64>, k: usize) -> TrustResult<Self> {
        check_fit_inputs(&features, &target, k)?;
        let k = k.min(features.nrows());

        let mut classes: Vec<f64> = target.iter().copied().collect();
        classes.sort_unstable_by(f64::total_cmp);
        classes.dedup();

        Ok(Self {
            features,
            target,
            classes,
            k,
        })
    }

    fn vote_fractions(&self, features: &DMatrix<f64>, row: usize) -> Vec<f64> {
        let neighbours = nearest_indices(&self.features, features, row, self.k);
        let mut votes = vec![0usize; self.classes.len()];
        for &i in &neighbours {
            let label = self.target[i];
            if let Some(pos) = self.classes.iter().position(|c| *c == label) {
                votes[pos] += 1;
            }
        }
        votes
            .into_iter()
            .map(|v| v as f64 / neighbours.len() as f64)
            .collect()
    }
}

impl Estimator for KnnClassifier {
    fn predict(&self, features: &DMatrix<f64>) -> TrustResult<DVector<f64>> {
        check_query(self.features.ncols(), features)?;

        let predictions = (0..features.nrows()).map(|row| {
            let fractions = self.vote_fractions(features, row);
            let best = fractions
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.classes[best]
        });
        Ok(DVector::from_iterator(features.nrows(), predictions))
    }

    fn probabilistic(&self) -> Option<&dyn ProbabilisticEstimator> {
        Some(self)
    }
}

impl ProbabilisticEstimator for KnnClassifier {
    fn predict_probabilities(&self, features: &DMatrix<f64>) -> TrustResult<DMatrix<f64>> {
        check_query(self.features.ncols(), features)?;

        let mut probabilities = DMatrix::zeros(features.nrows(), self.classes.len());
        for row in 0..features.nrows() {
            let fractions = self.vote_fractions(features, row);
            for (col, p) in fractions.into_iter().enumerate() {
                probabilities[(row, col)] = p;
            }
        }
        Ok(probabilities)
    }

    fn classes(&self) -> &[f64] {
        &self.classes
    }
}

/// [`EstimatorBuilder`] producing [`KnnRegressor`] sub-models.
#[derive(Debug, Clone)]
pub struct KnnRegressorBuilder {
    k: usize,
}

impl KnnRegressorBuilder {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for KnnRegressorBuilder {
    fn default() -> Self {
        Self::new(5)
    }
}

impl EstimatorBuilder for KnnRegressorBuilder {
    fn fit(
        &self,
        features: &DMatrix<f64>,
        target: &DVector<f64>,
    ) -> TrustResult<Box<dyn Estimator>> {
        let model = KnnRegressor::fit(features.clone(), target.clone(), self.k)?;
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_like_data() -> (DMatrix<f64>, DVector<f64>) {
        let x = DMatrix::from_row_slice(
            8,
            2,
            &[
                0.0, 0.0, 0.1, 0.0, 0.0, 0.1, 0.1, 0.1, //
                1.0, 1.0, 0.9, 1.0, 1.0, 0.9, 0.9, 0.9,
            ],
        );
        let y = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        (x, y)
    }

    #[test]
    fn test_regressor_interpolates_neighbours() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![0.0, 10.0, 20.0, 30.0]);
        let model = KnnRegressor::fit(x, y, 2).unwrap();

        let query = DMatrix::from_row_slice(1, 1, &[0.4]);
        let pred = model.predict(&query).unwrap();
        // Nearest two neighbours are 0.0 and 1.0.
        assert!((pred[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_classifier_probabilities_sum_to_one() {
        let (x, y) = xor_like_data();
        let model = KnnClassifier::fit(x, y, 3).unwrap();

        let query = DMatrix::from_row_slice(2, 2, &[0.05, 0.05, 0.95, 0.95]);
        let probas = model.predict_probabilities(&query).unwrap();

        assert_eq!(probas.shape(), (2, 2));
        for row in 0..2 {
            let total: f64 = probas.row(row).iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }

        let preds = model.predict(&query).unwrap();
        assert_eq!(preds[0], 0.0);
        assert_eq!(preds[1], 1.0);
    }

    #[test]
    fn test_capability_query() {
        let (x, y) = xor_like_data();
        let classifier = KnnClassifier::fit(x.clone(), y.clone(), 3).unwrap();
        let regressor = KnnRegressor::fit(x, y, 3).unwrap();

        assert!(classifier.probabilistic().is_some());
        assert!(regressor.probabilistic().is_none());
    }

    #[test]
    fn test_fit_rejects_bad_inputs() {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let y = DVector::from_vec(vec![0.0, 1.0]);

        assert!(matches!(
            KnnRegressor::fit(x.clone(), y.clone(), 0),
            Err(TrustError::Configuration(_))
        ));
        assert!(matches!(
            KnnRegressor::fit(DMatrix::zeros(0, 1), DVector::zeros(0), 1),
            Err(TrustError::InsufficientData(_))
        ));
        assert!(matches!(
            KnnRegressor::fit(x, DVector::zeros(3), 1),
            Err(TrustError::InvalidData(_))
        ));
    }
}
