//! Read-only scoring inputs produced by the upstream scoring subsystem.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use trust_core::{TrustError, TrustResult};

use crate::report::{display, Report};

/// Point value and confidence interval of one scoring metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringMetricReport {
    metric: String,
    value: f64,
    ci_low: f64,
    ci_high: f64,
    ci_ratio: f64,
}

impl ScoringMetricReport {
    pub fn new(
        metric: impl Into<String>,
        value: f64,
        ci_low: f64,
        ci_high: f64,
    ) -> TrustResult<Self> {
        let metric = metric.into();
        if !value.is_finite() || !ci_low.is_finite() || !ci_high.is_finite() {
            return Err(TrustError::InvalidData(format!(
                "non-finite scores for metric '{metric}'"
            )));
        }
        if ci_low > ci_high {
            return Err(TrustError::Configuration(format!(
                "confidence interval for '{metric}' has ci_low {ci_low} above ci_high {ci_high}"
            )));
        }
        let ci_ratio = (ci_high - ci_low) / value.abs().max(f64::EPSILON);
        Ok(Self {
            metric,
            value,
            ci_low,
            ci_high,
            ci_ratio,
        })
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn ci_low(&self) -> f64 {
        self.ci_low
    }

    pub fn ci_high(&self) -> f64 {
        self.ci_high
    }

    /// Confidence-interval width relative to the point estimate.
    pub fn ci_ratio(&self) -> f64 {
        self.ci_ratio
    }
}

impl Report for ScoringMetricReport {
    fn to_json(&self, printable: bool) -> Value {
        json!({
            "metric": self.metric,
            "value": display(self.value, printable),
            "ci_low": display(self.ci_low, printable),
            "ci_high": display(self.ci_high, printable),
            "ci_ratio": display(self.ci_ratio, printable),
        })
    }

    fn to_json_meaning() -> Value {
        json!({
            "metric": "Name of the metric the scores refer to",
            "value": "Metric value measured on the test set",
            "ci_low": "Lower bound of the metric's confidence interval",
            "ci_high": "Upper bound of the metric's confidence interval",
            "ci_ratio": "Width of the confidence interval relative to the metric value - lower is better",
        })
    }
}

/// Full scoring output: one metric report per metric plus how well the
/// model's score distribution separates from a shuffled baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringFullReport {
    metric_scores: BTreeMap<String, ScoringMetricReport>,
    separation_quality: f64,
}

impl ScoringFullReport {
    pub fn new(
        metric_reports: Vec<ScoringMetricReport>,
        separation_quality: f64,
    ) -> TrustResult<Self> {
        if !(0.0..=1.0).contains(&separation_quality) {
            return Err(TrustError::InvalidData(format!(
                "separation_quality {separation_quality} outside [0, 1]"
            )));
        }
        let mut metric_scores = BTreeMap::new();
        for report in metric_reports {
            let metric = report.metric().to_string();
            if metric_scores.insert(metric.clone(), report).is_some() {
                return Err(TrustError::Configuration(format!(
                    "duplicate metric report for '{metric}'"
                )));
            }
        }
        Ok(Self {
            metric_scores,
            separation_quality,
        })
    }

    pub fn metric_score(&self, metric: &str) -> Option<&ScoringMetricReport> {
        self.metric_scores.get(metric)
    }

    pub fn metric_scores(&self) -> &BTreeMap<String, ScoringMetricReport> {
        &self.metric_scores
    }

    pub fn separation_quality(&self) -> f64 {
        self.separation_quality
    }
}

impl Report for ScoringFullReport {
    fn to_json(&self, printable: bool) -> Value {
        let metric_scores: Value = self
            .metric_scores
            .iter()
            .map(|(name, report)| (name.clone(), report.to_json(printable)))
            .collect::<serde_json::Map<String, Value>>()
            .into();
        json!({
            "metric_scores": metric_scores,
            "separation_quality": display(self.separation_quality, printable),
        })
    }

    fn to_json_meaning() -> Value {
        json!({
            "metric_scores": "Mapping {metric name: metric score report}, one entry per scored metric",
            "separation_quality": "How well the model's score distribution separates from a random baseline - higher is better",
        })
    }
}
