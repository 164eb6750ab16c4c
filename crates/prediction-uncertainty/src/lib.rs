//! Prediction Uncertainty Module
//!
//! Wraps an externally trained model and derives a per-prediction
//! uncertainty score: higher values flag predictions expected to be less
//! accurate. Classification models are scored through their class
//! probabilities; regression models through the spread of a bootstrap
//! ensemble fitted on a held-out calibration set.

pub mod classifier;
pub mod method;
pub mod model;
pub mod regressor;

pub use classifier::UncertaintyModelClassifier;
pub use method::{ClassificationMethod, RegressionMethod};
pub use model::UncertaintyModel;
pub use regressor::{EnsembleOptions, UncertaintyModelRegressor};
