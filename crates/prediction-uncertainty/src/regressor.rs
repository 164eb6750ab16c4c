//! Regression uncertainty from a bootstrap ensemble. Regression models have
//! no probability output, so the signal is synthesized: sub-models are
//! fitted on resampled calibration data and their prediction spread, scaled
//! to the wrapped model's residual magnitude, becomes the per-row score.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use trust_core::neighbors::KnnRegressorBuilder;
use trust_core::pipeline::ImputationPipeline;
use trust_core::{Dataset, Estimator, EstimatorBuilder, TrustError, TrustResult};

use crate::method::RegressionMethod;
use crate::model::{check_calibration_set, check_query, not_fitted, UncertaintyModel};

/// Knobs for the bootstrap ensemble fit. `n_estimators` trades compute for
/// signal quality; `n_jobs` trades compute for latency (`None` uses all
/// available workers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleOptions {
    pub n_estimators: usize,
    pub n_jobs: Option<usize>,
    pub seed: u64,
    /// Minimum surviving sub-models before the fit is declared failed.
    pub min_fitted: usize,
}

impl Default for EnsembleOptions {
    fn default() -> Self {
        Self {
            n_estimators: 10,
            n_jobs: None,
            seed: 0,
            min_fitted: 2,
        }
    }
}

struct EnsembleState {
    members: Vec<Box<dyn Estimator>>,
    scale: f64,
    n_features: usize,
}

/// Uncertainty model for regressors.
pub struct UncertaintyModelRegressor {
    model: Arc<dyn Estimator>,
    method: RegressionMethod,
    builder: Arc<dyn EstimatorBuilder>,
    state: Option<EnsembleState>,
}

impl UncertaintyModelRegressor {
    /// Wrap a trained regressor. The method name is validated here;
    /// unsupported names fail with a configuration error. Sub-models default
    /// to mean-imputing k-NN regressors.
    pub fn new(model: Arc<dyn Estimator>, method: &str) -> TrustResult<Self> {
        Ok(Self {
            model,
            method: RegressionMethod::parse(method)?,
            builder: Arc::new(ImputationPipeline::new(KnnRegressorBuilder::default())),
            state: None,
        })
    }

    /// Replace the sub-model family used for the bootstrap ensemble.
    pub fn with_builder(mut self, builder: Arc<dyn EstimatorBuilder>) -> Self {
        self.builder = builder;
        self
    }

    pub fn method(&self) -> RegressionMethod {
        self.method
    }

    /// Fit the bootstrap ensemble on a held-out calibration set.
    pub fn fit_with(
        &mut self,
        calibration: &Dataset,
        options: &EnsembleOptions,
    ) -> TrustResult<()> {
        if options.n_estimators == 0 {
            return Err(TrustError::Configuration(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if options.min_fitted == 0 {
            return Err(TrustError::Configuration(
                "min_fitted must be at least 1".to_string(),
            ));
        }
        if options.n_jobs == Some(0) {
            return Err(TrustError::Configuration(
                "n_jobs must be at least 1".to_string(),
            ));
        }
        check_calibration_set(calibration)?;
        let target = calibration.require_target()?;
        let n = calibration.n_samples();
        if n < 2 {
            return Err(TrustError::InsufficientData(format!(
                "{n} calibration rows are not enough to bootstrap an ensemble"
            )));
        }

        // Index draws are sequential and seeded, so the ensemble is
        // reproducible regardless of how the fits are scheduled.
        let mut rng = StdRng::seed_from_u64(options.seed);
        let samples: Vec<Vec<usize>> = (0..options.n_estimators)
            .map(|_| (0..n).map(|_| rng.gen_range(0..n)).collect())
            .collect();

        let features = calibration.features();
        let builder = Arc::clone(&self.builder);
        let fit_one = |indices: &Vec<usize>| -> TrustResult<Box<dyn Estimator>> {
            let sub_x = rows_subset(features, indices);
            let sub_y =
                DVector::from_iterator(indices.len(), indices.iter().map(|&i| target[i]));
            builder.fit(&sub_x, &sub_y)
        };

        let results: Vec<TrustResult<Box<dyn Estimator>>> = match options.n_jobs {
            Some(1) => samples.iter().map(fit_one).collect(),
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        TrustError::Configuration(format!(
                            "failed to build {threads}-worker pool: {e}"
                        ))
                    })?;
                pool.install(|| samples.par_iter().map(fit_one).collect())
            }
            None => samples.par_iter().map(fit_one).collect(),
        };

        let mut members = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(member) => members.push(member),
                Err(err) => {
                    tracing::warn!("bootstrap sub-model fit failed, skipping: {err}");
                }
            }
        }
        let required = options.min_fitted.min(options.n_estimators);
        if members.len() < required {
            return Err(TrustError::InsufficientData(format!(
                "only {} of {} bootstrap sub-models could be fitted",
                members.len(),
                options.n_estimators
            )));
        }

        // Scale raw spread to the wrapped model's residual magnitude on the
        // calibration set, so scores track expected error size.
        let dispersion = ensemble_dispersion(&members, features, self.method)?;
        let predictions = self.model.predict(features)?;
        let residuals: Vec<f64> = predictions
            .iter()
            .zip(target.iter())
            .map(|(p, t)| (t - p).abs())
            .collect();
        let mean_residual = residuals.as_slice().mean();
        let mean_dispersion = dispersion.as_slice().mean();
        let scale = if mean_dispersion > f64::EPSILON && mean_residual.is_finite() {
            mean_residual / mean_dispersion
        } else {
            1.0
        };

        tracing::debug!(
            method = self.method.name(),
            members = members.len(),
            scale,
            "fitted regression uncertainty ensemble"
        );
        self.state = Some(EnsembleState {
            members,
            scale,
            n_features: calibration.n_features(),
        });
        Ok(())
    }
}

/// Copy of the selected rows of `matrix`.
fn rows_subset(matrix: &DMatrix<f64>, indices: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(indices.len(), matrix.ncols(), |row, col| {
        matrix[(indices[row], col)]
    })
}

/// Per-row spread of the ensemble's predictions.
fn ensemble_dispersion(
    members: &[Box<dyn Estimator>],
    features: &DMatrix<f64>,
    method: RegressionMethod,
) -> TrustResult<DVector<f64>> {
    let mut predictions = Vec::with_capacity(members.len());
    for member in members {
        predictions.push(member.predict(features)?);
    }

    let count = predictions.len() as f64;
    let values = (0..features.nrows()).map(|row| {
        let mean = predictions.iter().map(|p| p[row]).sum::<f64>() / count;
        match method {
            RegressionMethod::Mae => {
                predictions.iter().map(|p| (p[row] - mean).abs()).sum::<f64>() / count
            }
            RegressionMethod::Std => {
                (predictions.iter().map(|p| (p[row] - mean).powi(2)).sum::<f64>() / count).sqrt()
            }
        }
    });
    Ok(DVector::from_iterator(features.nrows(), values))
}

impl UncertaintyModel for UncertaintyModelRegressor {
    fn fit(&mut self, calibration: &Dataset) -> TrustResult<()> {
        self.fit_with(calibration, &EnsembleOptions::default())
    }

    fn predict(&self, data: &Dataset) -> TrustResult<DVector<f64>> {
        if self.state.is_none() {
            return not_fitted("regression uncertainty model");
        }
        self.model.predict(data.features())
    }

    fn uncertainty(&self, data: &Dataset) -> TrustResult<DVector<f64>> {
        let state = match &self.state {
            Some(state) => state,
            None => return not_fitted("regression uncertainty model"),
        };
        check_query(state.n_features, data)?;

        let dispersion = ensemble_dispersion(&state.members, data.features(), self.method)?;
        Ok(dispersion * state.scale)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trust_core::metrics::r2_score;
    use trust_core::neighbors::KnnRegressor;
    use trust_core::stats::median_of_unique;

    /// Same shape as the classification fixture, continuous target.
    fn synthetic_regression(seed: u64, n: usize) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = DMatrix::from_fn(n, 5, |_, _| rng.gen::<f64>());
        for row in 0..n {
            x[(row, 1)] = 0.0;
        }
        let y = DVector::from_fn(n, |row, _| {
            let sum: f64 = x.row(row).iter().sum();
            sum + 2.0 * x[(row, 0)]
        });
        Dataset::new(x, y).unwrap()
    }

    fn wrapped_regressor(train: &Dataset) -> Arc<dyn Estimator> {
        Arc::new(
            KnnRegressor::fit(
                train.features().clone(),
                train.require_target().unwrap().clone(),
                8,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_mae_uncertainty_is_discriminative() {
        let train = synthetic_regression(0, 2000);
        let mut model =
            UncertaintyModelRegressor::new(wrapped_regressor(&train), "mae").unwrap();

        let calibration = synthetic_regression(1, 600);
        model.fit(&calibration).unwrap();

        let eval = synthetic_regression(2, 1000);
        let predictions = model.predict(&eval).unwrap();
        let uncertainty = model.uncertainty(&eval).unwrap();

        assert_eq!(uncertainty.len(), eval.n_samples());
        assert!(uncertainty.iter().all(|&u| u >= 0.0));

        let y_true = eval.require_target().unwrap();
        let base = r2_score(y_true.as_slice(), predictions.as_slice()).unwrap();

        let p50 = median_of_unique(uncertainty.as_slice()).unwrap();
        let subset_score = |keep: &dyn Fn(f64) -> bool| {
            let mut t = Vec::new();
            let mut p = Vec::new();
            for i in 0..eval.n_samples() {
                if keep(uncertainty[i]) {
                    t.push(y_true[i]);
                    p.push(predictions[i]);
                }
            }
            assert!(!t.is_empty());
            r2_score(&t, &p).unwrap()
        };

        let good = subset_score(&|u| u < p50);
        let bad = subset_score(&|u| u > p50);
        assert!(good > base, "good {good} <= base {base}");
        assert!(bad < base, "bad {bad} >= base {base}");
    }

    #[test]
    fn test_fit_is_reproducible_for_a_seed() {
        let train = synthetic_regression(0, 400);
        let calibration = synthetic_regression(1, 300);
        let eval = synthetic_regression(2, 50);

        let options = EnsembleOptions {
            n_estimators: 5,
            n_jobs: Some(1),
            ..Default::default()
        };

        let mut first =
            UncertaintyModelRegressor::new(wrapped_regressor(&train), "mae").unwrap();
        first.fit_with(&calibration, &options).unwrap();

        let mut second =
            UncertaintyModelRegressor::new(wrapped_regressor(&train), "mae").unwrap();
        second.fit_with(&calibration, &options).unwrap();

        let a = first.uncertainty(&eval).unwrap();
        let b = second.uncertainty(&eval).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_fit_matches_contract() {
        let train = synthetic_regression(0, 400);
        let calibration = synthetic_regression(1, 300);

        let mut model =
            UncertaintyModelRegressor::new(wrapped_regressor(&train), "std").unwrap();
        let options = EnsembleOptions {
            n_estimators: 6,
            n_jobs: Some(2),
            ..Default::default()
        };
        model.fit_with(&calibration, &options).unwrap();

        let eval = synthetic_regression(2, 100);
        let uncertainty = model.uncertainty(&eval).unwrap();
        assert_eq!(uncertainty.len(), 100);
        assert!(uncertainty.iter().all(|&u| u >= 0.0));
    }

    #[test]
    fn test_query_before_fit_fails() {
        let train = synthetic_regression(0, 100);
        let model = UncertaintyModelRegressor::new(wrapped_regressor(&train), "mae").unwrap();

        assert!(!model.is_fitted());
        assert!(matches!(
            model.predict(&train),
            Err(TrustError::NotFitted(_))
        ));
        assert!(matches!(
            model.uncertainty(&train),
            Err(TrustError::NotFitted(_))
        ));
    }

    #[test]
    fn test_unknown_method_rejected() {
        let train = synthetic_regression(0, 100);
        assert!(matches!(
            UncertaintyModelRegressor::new(wrapped_regressor(&train), "bogus"),
            Err(TrustError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let train = synthetic_regression(0, 100);
        let calibration = synthetic_regression(1, 100);
        let mut model =
            UncertaintyModelRegressor::new(wrapped_regressor(&train), "mae").unwrap();

        let zero_estimators = EnsembleOptions {
            n_estimators: 0,
            ..Default::default()
        };
        assert!(matches!(
            model.fit_with(&calibration, &zero_estimators),
            Err(TrustError::Configuration(_))
        ));

        let zero_jobs = EnsembleOptions {
            n_jobs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            model.fit_with(&calibration, &zero_jobs),
            Err(TrustError::Configuration(_))
        ));
    }

    #[test]
    fn test_unlabeled_calibration_rejected() {
        let train = synthetic_regression(0, 100);
        let mut model =
            UncertaintyModelRegressor::new(wrapped_regressor(&train), "mae").unwrap();

        let unlabeled = Dataset::unlabeled(train.features().clone());
        assert!(matches!(
            model.fit(&unlabeled),
            Err(TrustError::InvalidData(_))
        ));
    }

    struct FailingBuilder;

    impl EstimatorBuilder for FailingBuilder {
        fn fit(
            &self,
            _features: &DMatrix<f64>,
            _target: &DVector<f64>,
        ) -> TrustResult<Box<dyn Estimator>> {
            Err(TrustError::InvalidData(
                "degenerate bootstrap sample".to_string(),
            ))
        }
    }

    #[test]
    fn test_all_sub_models_failing_escalates() {
        let train = synthetic_regression(0, 100);
        let calibration = synthetic_regression(1, 100);

        let mut model = UncertaintyModelRegressor::new(wrapped_regressor(&train), "mae")
            .unwrap()
            .with_builder(Arc::new(FailingBuilder));

        assert!(matches!(
            model.fit(&calibration),
            Err(TrustError::InsufficientData(_))
        ));
        assert!(!model.is_fitted());
    }
}
