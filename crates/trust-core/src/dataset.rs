use nalgebra::{DMatrix, DVector};

use crate::error::{TrustError, TrustResult};

/// Feature matrix plus optional target and column metadata, handed to
/// fit/predict/uncertainty calls. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: DMatrix<f64>,
    target: Option<DVector<f64>>,
    feature_names: Option<Vec<String>>,
    categorical: Option<Vec<bool>>,
}

impl Dataset {
    /// Labeled dataset. Fails when the target length disagrees with the
    /// number of rows.
    pub fn new(features: DMatrix<f64>, target: DVector<f64>) -> TrustResult<Self> {
        Self::build(features, Some(target), None)
    }

    /// Labeled dataset with explicit feature names.
    pub fn with_names(
        features: DMatrix<f64>,
        target: DVector<f64>,
        feature_names: Vec<String>,
    ) -> TrustResult<Self> {
        Self::build(features, Some(target), Some(feature_names))
    }

    /// Feature-only dataset, used at prediction time.
    pub fn unlabeled(features: DMatrix<f64>) -> Self {
        Self {
            features,
            target: None,
            feature_names: None,
            categorical: None,
        }
    }

    /// Mark which columns hold categorical values.
    pub fn with_categorical(mut self, categorical: Vec<bool>) -> TrustResult<Self> {
        if categorical.len() != self.n_features() {
            return Err(TrustError::InvalidData(format!(
                "{} categorical flags given for {} columns",
                categorical.len(),
                self.n_features()
            )));
        }
        self.categorical = Some(categorical);
        Ok(self)
    }

    fn build(
        features: DMatrix<f64>,
        target: Option<DVector<f64>>,
        feature_names: Option<Vec<String>>,
    ) -> TrustResult<Self> {
        if let Some(y) = &target {
            if y.len() != features.nrows() {
                return Err(TrustError::InvalidData(format!(
                    "target has {} entries but feature matrix has {} rows",
                    y.len(),
                    features.nrows()
                )));
            }
        }
        if let Some(names) = &feature_names {
            if names.len() != features.ncols() {
                return Err(TrustError::InvalidData(format!(
                    "{} feature names given for {} columns",
                    names.len(),
                    features.ncols()
                )));
            }
        }
        Ok(Self {
            features,
            target,
            feature_names,
            categorical: None,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    pub fn features(&self) -> &DMatrix<f64> {
        &self.features
    }

    pub fn target(&self) -> Option<&DVector<f64>> {
        self.target.as_ref()
    }

    /// Target vector, or `InvalidData` when the dataset is unlabeled.
    pub fn require_target(&self) -> TrustResult<&DVector<f64>> {
        self.target
            .as_ref()
            .ok_or_else(|| TrustError::InvalidData("dataset has no target vector".to_string()))
    }

    /// Per-column categorical flags, when declared.
    pub fn categorical(&self) -> Option<&[bool]> {
        self.categorical.as_deref()
    }

    /// Declared feature names, or synthesized `f_0..f_{n-1}` when none were
    /// provided.
    pub fn feature_names(&self) -> Vec<String> {
        match &self.feature_names {
            Some(names) => names.clone(),
            None => (0..self.n_features()).map(|k| format!("f_{k}")).collect(),
        }
    }
}
