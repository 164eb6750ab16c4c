//! Classification uncertainty from the wrapped model's own probability
//! output. The calibration set is only used to rescale scores, never to
//! retrain anything.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use trust_core::{Dataset, Estimator, ProbabilisticEstimator, TrustError, TrustResult};

use crate::method::ClassificationMethod;
use crate::model::{check_calibration_set, check_query, not_fitted, UncertaintyModel};

struct ClassifierState {
    n_features: usize,
    /// Sorted top-2 margins observed on the calibration set. Empty for the
    /// confidence method, which needs no calibration statistics.
    sorted_margins: Vec<f64>,
}

/// Uncertainty model for classifiers.
pub struct UncertaintyModelClassifier {
    model: Arc<dyn Estimator>,
    method: ClassificationMethod,
    state: Option<ClassifierState>,
}

impl UncertaintyModelClassifier {
    /// Wrap a trained classifier. The method name is validated here;
    /// unsupported names fail with a configuration error.
    pub fn new(model: Arc<dyn Estimator>, method: &str) -> TrustResult<Self> {
        Ok(Self {
            model,
            method: ClassificationMethod::parse(method)?,
            state: None,
        })
    }

    pub fn method(&self) -> ClassificationMethod {
        self.method
    }

    fn probabilistic(&self) -> TrustResult<&dyn ProbabilisticEstimator> {
        self.model.probabilistic().ok_or_else(|| {
            TrustError::Capability(format!(
                "uncertainty method '{}' requires class-probability output, \
                 which the wrapped model does not provide",
                self.method.name()
            ))
        })
    }

    /// Probability gap between the two strongest classes of one row.
    fn margin(probabilities: &DMatrix<f64>, row: usize) -> f64 {
        let mut first = 0.0f64;
        let mut second = 0.0f64;
        for &p in probabilities.row(row).iter() {
            if p > first {
                second = first;
                first = p;
            } else if p > second {
                second = p;
            }
        }
        first - second
    }

    /// Fraction of calibration margins at or below `margin`.
    fn margin_rank(sorted_margins: &[f64], margin: f64) -> f64 {
        if sorted_margins.is_empty() {
            return 0.0;
        }
        let below = sorted_margins.partition_point(|&m| m <= margin);
        below as f64 / sorted_margins.len() as f64
    }
}

impl UncertaintyModel for UncertaintyModelClassifier {
    fn fit(&mut self, calibration: &Dataset) -> TrustResult<()> {
        check_calibration_set(calibration)?;
        // Capability is checked once here, not assumed at every query.
        let probabilistic = self.probabilistic()?;

        let sorted_margins = match self.method {
            ClassificationMethod::Confidence => Vec::new(),
            ClassificationMethod::Probability => {
                let probabilities =
                    probabilistic.predict_probabilities(calibration.features())?;
                let mut margins: Vec<f64> = (0..probabilities.nrows())
                    .map(|row| Self::margin(&probabilities, row))
                    .collect();
                margins.sort_unstable_by(f64::total_cmp);
                margins
            }
        };

        tracing::debug!(
            method = self.method.name(),
            rows = calibration.n_samples(),
            "fitted classification uncertainty model"
        );
        self.state = Some(ClassifierState {
            n_features: calibration.n_features(),
            sorted_margins,
        });
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> TrustResult<DVector<f64>> {
        if self.state.is_none() {
            return not_fitted("classification uncertainty model");
        }
        self.model.predict(data.features())
    }

    fn uncertainty(&self, data: &Dataset) -> TrustResult<DVector<f64>> {
        let state = match &self.state {
            Some(state) => state,
            None => return not_fitted("classification uncertainty model"),
        };
        check_query(state.n_features, data)?;

        let probabilities = self.probabilistic()?.predict_probabilities(data.features())?;
        let scores = (0..probabilities.nrows()).map(|row| match self.method {
            ClassificationMethod::Confidence => {
                let confidence = probabilities
                    .row(row)
                    .iter()
                    .fold(0.0f64, |acc, &p| acc.max(p));
                1.0 - confidence
            }
            ClassificationMethod::Probability => {
                let margin = Self::margin(&probabilities, row);
                1.0 - Self::margin_rank(&state.sorted_margins, margin)
            }
        });
        Ok(DVector::from_iterator(probabilities.nrows(), scores))
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
