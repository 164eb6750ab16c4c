//! Closed enumerations of the supported uncertainty methods. Method names
//! arrive as strings from callers and are validated here, once, at model
//! construction; unknown names fail instead of falling through to a default.

use serde::{Deserialize, Serialize};

use trust_core::{TrustError, TrustResult};

/// How a classifier's uncertainty is derived from its probability output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationMethod {
    /// `1 - max class probability`: low confidence means high uncertainty.
    Confidence,
    /// Top-2 probability margin, rank-calibrated against the calibration
    /// set's margin distribution so scores are comparable across models.
    Probability,
}

impl ClassificationMethod {
    pub fn parse(name: &str) -> TrustResult<Self> {
        match name {
            "confidence" | "default" => Ok(Self::Confidence),
            "probability" => Ok(Self::Probability),
            other => Err(TrustError::Configuration(format!(
                "unknown classification uncertainty method '{other}', \
                 expected one of: confidence, probability"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Confidence => "confidence",
            Self::Probability => "probability",
        }
    }
}

/// Which dispersion statistic summarizes the bootstrap ensemble's spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegressionMethod {
    /// Mean absolute deviation of the sub-model predictions around their mean.
    Mae,
    /// Standard deviation of the sub-model predictions.
    Std,
}

impl RegressionMethod {
    pub fn parse(name: &str) -> TrustResult<Self> {
        match name {
            "mae" | "default" => Ok(Self::Mae),
            "std" | "rmse" => Ok(Self::Std),
            other => Err(TrustError::Configuration(format!(
                "unknown regression uncertainty method '{other}', \
                 expected one of: mae, std"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mae => "mae",
            Self::Std => "std",
        }
    }
}
