//! Quality Report Module
//!
//! Folds independently computed scoring and sensitivity reports into
//! bounded composite quality scores for the train and test sets. Pure
//! arithmetic: every aggregate is computed once at construction and the
//! reports are immutable afterwards.

pub mod quality;
pub mod report;
pub mod scoring;
pub mod vulnerability;

pub use quality::{QualityReport, TestSetQualityReport, TrainSetQualityReport};
pub use report::Report;
pub use scoring::{ScoringFullReport, ScoringMetricReport};
pub use vulnerability::SensitivityVulnerabilityReport;
