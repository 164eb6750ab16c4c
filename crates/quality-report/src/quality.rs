//! Composite quality scores. Both composites treat their penalties as an
//! additive risk budget of total mass 1 and floor the result at zero, so a
//! quality score is always in [0, 1]. Different risk profiles can alias to
//! the same composite; the aggregation is intentionally that coarse.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use trust_core::{TrustError, TrustResult};

use crate::report::{display, Report};
use crate::scoring::ScoringFullReport;
use crate::vulnerability::SensitivityVulnerabilityReport;

/// Trustworthiness of the test set with respect to one scoring metric:
/// penalized by a wide confidence interval and by poor separation from the
/// shuffled baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSetQualityReport {
    scoring_report: ScoringFullReport,
    metric: String,
    ci_ratio: f64,
    test_set_quality: f64,
}

impl TestSetQualityReport {
    /// Fails when `metric` has no entry in the scoring report.
    pub fn new(scoring_report: ScoringFullReport, metric: &str) -> TrustResult<Self> {
        let ci_ratio = scoring_report
            .metric_score(metric)
            .ok_or_else(|| {
                TrustError::Configuration(format!(
                    "metric '{metric}' not present in the scoring report"
                ))
            })?
            .ci_ratio();

        let separation_quality = scoring_report.separation_quality();
        let test_set_quality = (1.0 - ci_ratio - (1.0 - separation_quality)).max(0.0);

        Ok(Self {
            scoring_report,
            metric: metric.to_string(),
            ci_ratio,
            test_set_quality,
        })
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn ci_ratio(&self) -> f64 {
        self.ci_ratio
    }

    pub fn separation_quality(&self) -> f64 {
        self.scoring_report.separation_quality()
    }

    pub fn scoring_report(&self) -> &ScoringFullReport {
        &self.scoring_report
    }

    pub fn test_set_quality(&self) -> f64 {
        self.test_set_quality
    }
}

impl Report for TestSetQualityReport {
    fn to_json(&self, printable: bool) -> Value {
        json!({
            "ci_ratio": display(self.ci_ratio, printable),
            "separation_quality": display(self.separation_quality(), printable),
            "test_set_quality": display(self.test_set_quality, printable),
        })
    }

    fn to_json_meaning() -> Value {
        json!({
            "ci_ratio": "Width of the confidence interval relative to the metric value - lower is better",
            "separation_quality": "How well the model's score distribution separates from a random baseline - higher is better",
            "test_set_quality": "Overall test set quality - higher is better",
        })
    }
}

/// Trustworthiness of the train set: penalized by each vulnerability the
/// sensitivity analysis flagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSetQualityReport {
    vulnerability_report: SensitivityVulnerabilityReport,
    train_set_quality: f64,
}

impl TrainSetQualityReport {
    pub fn new(vulnerability_report: SensitivityVulnerabilityReport) -> Self {
        let train_set_quality = (1.0
            - vulnerability_report.leakage()
            - vulnerability_report.too_many_features()
            - vulnerability_report.imputation())
        .max(0.0);

        Self {
            vulnerability_report,
            train_set_quality,
        }
    }

    pub fn vulnerability_report(&self) -> &SensitivityVulnerabilityReport {
        &self.vulnerability_report
    }

    pub fn train_set_quality(&self) -> f64 {
        self.train_set_quality
    }
}

impl Report for TrainSetQualityReport {
    fn to_json(&self, printable: bool) -> Value {
        json!({
            "vulnerability_report": self.vulnerability_report.to_json(printable),
            "train_set_quality": display(self.train_set_quality, printable),
        })
    }

    fn to_json_meaning() -> Value {
        json!({
            "vulnerability_report": SensitivityVulnerabilityReport::to_json_meaning(),
            "train_set_quality": "Overall train set quality - higher is better",
        })
    }
}

/// Pure composition of the train- and test-set quality reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    train_quality_report: TrainSetQualityReport,
    test_quality_report: TestSetQualityReport,
}

impl QualityReport {
    pub fn new(
        train_quality_report: TrainSetQualityReport,
        test_quality_report: TestSetQualityReport,
    ) -> Self {
        Self {
            train_quality_report,
            test_quality_report,
        }
    }

    pub fn train_quality_report(&self) -> &TrainSetQualityReport {
        &self.train_quality_report
    }

    pub fn test_quality_report(&self) -> &TestSetQualityReport {
        &self.test_quality_report
    }
}

impl Report for QualityReport {
    fn to_json(&self, printable: bool) -> Value {
        json!({
            "test_quality_report": self.test_quality_report.to_json(printable),
            "train_quality_report": self.train_quality_report.to_json(printable),
        })
    }

    fn to_json_meaning() -> Value {
        json!({
            "test_quality_report": TestSetQualityReport::to_json_meaning(),
            "train_quality_report": TrainSetQualityReport::to_json_meaning(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assert_keys_documented;
    use crate::scoring::ScoringMetricReport;

    /// Scoring report with the requested ci_ratio for a unit-valued metric.
    fn scoring_with(ci_ratio: f64, separation_quality: f64) -> ScoringFullReport {
        let half = ci_ratio / 2.0;
        let metric = ScoringMetricReport::new("recall", 1.0, 1.0 - half, 1.0 + half).unwrap();
        ScoringFullReport::new(vec![metric], separation_quality).unwrap()
    }

    #[test]
    fn test_test_set_quality_nominal() {
        let report = TestSetQualityReport::new(scoring_with(0.1, 0.8), "recall").unwrap();
        assert!((report.test_set_quality() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_test_set_quality_floors_at_zero() {
        // Penalties sum to 1.1; the composite floors at 0 instead of -0.1.
        let report = TestSetQualityReport::new(scoring_with(0.6, 0.5), "recall").unwrap();
        assert_eq!(report.test_set_quality(), 0.0);
    }

    #[test]
    fn test_unknown_metric_rejected() {
        assert!(matches!(
            TestSetQualityReport::new(scoring_with(0.1, 0.8), "rmse"),
            Err(TrustError::Configuration(_))
        ));
    }

    #[test]
    fn test_train_set_quality_nominal() {
        let vulnerability = SensitivityVulnerabilityReport::new(0.1, 0.1, 0.1).unwrap();
        let report = TrainSetQualityReport::new(vulnerability);
        assert!((report.train_set_quality() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_train_set_quality_floors_at_zero() {
        // Penalties sum to 1.2; the composite floors at 0.
        let vulnerability = SensitivityVulnerabilityReport::new(0.5, 0.4, 0.3).unwrap();
        let report = TrainSetQualityReport::new(vulnerability);
        assert_eq!(report.train_set_quality(), 0.0);
    }

    #[test]
    fn test_quality_report_composes_without_arithmetic() {
        let train = TrainSetQualityReport::new(
            SensitivityVulnerabilityReport::new(0.2, 0.0, 0.1).unwrap(),
        );
        let test = TestSetQualityReport::new(scoring_with(0.1, 0.9), "recall").unwrap();

        let report = QualityReport::new(train, test);
        assert!((report.train_quality_report().train_set_quality() - 0.7).abs() < 1e-12);
        assert!((report.test_quality_report().test_set_quality() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_summary_keys_documented() {
        let train = TrainSetQualityReport::new(
            SensitivityVulnerabilityReport::new(0.2, 0.0, 0.1).unwrap(),
        );
        let test = TestSetQualityReport::new(scoring_with(0.1, 0.9), "recall").unwrap();

        assert_keys_documented(&train.to_json(true), &TrainSetQualityReport::to_json_meaning());
        assert_keys_documented(&test.to_json(true), &TestSetQualityReport::to_json_meaning());

        let full = QualityReport::new(train, test);
        assert_keys_documented(&full.to_json(true), &QualityReport::to_json_meaning());
    }

    #[test]
    fn test_printable_summary_rounds_scalars() {
        let metric = ScoringMetricReport::new("recall", 1.0, 0.9, 1.0 + 1.0 / 3.0).unwrap();
        let scoring = ScoringFullReport::new(vec![metric], 0.9).unwrap();
        let report = TestSetQualityReport::new(scoring, "recall").unwrap();

        let printable = report.to_json(true);
        assert_eq!(printable["ci_ratio"], 0.43333);

        let raw = report.to_json(false);
        let ci_ratio = raw["ci_ratio"].as_f64().unwrap();
        assert!((ci_ratio - (0.1 + 1.0 / 3.0)).abs() < 1e-12);
    }
}
