//! Read-only sensitivity-analysis inputs: each field is a penalty in
//! [0, 1] flagging a specific train-set trustworthiness risk.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use trust_core::{TrustError, TrustResult};

use crate::report::{display, Report};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVulnerabilityReport {
    leakage: f64,
    too_many_features: f64,
    imputation: f64,
}

impl SensitivityVulnerabilityReport {
    pub fn new(leakage: f64, too_many_features: f64, imputation: f64) -> TrustResult<Self> {
        for (name, value) in [
            ("leakage", leakage),
            ("too_many_features", too_many_features),
            ("imputation", imputation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrustError::InvalidData(format!(
                    "{name} penalty {value} outside [0, 1]"
                )));
            }
        }
        Ok(Self {
            leakage,
            too_many_features,
            imputation,
        })
    }

    pub fn leakage(&self) -> f64 {
        self.leakage
    }

    pub fn too_many_features(&self) -> f64 {
        self.too_many_features
    }

    pub fn imputation(&self) -> f64 {
        self.imputation
    }
}

impl Report for SensitivityVulnerabilityReport {
    fn to_json(&self, printable: bool) -> Value {
        json!({
            "leakage": display(self.leakage, printable),
            "too_many_features": display(self.too_many_features, printable),
            "imputation": display(self.imputation, printable),
        })
    }

    fn to_json_meaning() -> Value {
        json!({
            "leakage": "Chance the model exploits a feature that leaks the target - lower is better",
            "too_many_features": "Degree to which the model spreads its reliance over uninformative features - lower is better",
            "imputation": "Sensitivity of the model's predictions to missing-value imputation - lower is better",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assert_keys_documented;

    #[test]
    fn test_penalties_validated() {
        assert!(SensitivityVulnerabilityReport::new(0.1, 0.2, 0.3).is_ok());
        assert!(matches!(
            SensitivityVulnerabilityReport::new(-0.1, 0.2, 0.3),
            Err(TrustError::InvalidData(_))
        ));
        assert!(matches!(
            SensitivityVulnerabilityReport::new(0.1, 1.2, 0.3),
            Err(TrustError::InvalidData(_))
        ));
    }

    #[test]
    fn test_summary_keys_documented() {
        let report = SensitivityVulnerabilityReport::new(0.1, 0.2, 0.3).unwrap();
        assert_keys_documented(
            &report.to_json(true),
            &SensitivityVulnerabilityReport::to_json_meaning(),
        );
    }
}
