//! Records exchanged between the cleaner, analyzer, grader and the reporting layer.
//!
//! Field names are part of the contract with report renderers and email
//! templates, so they serialize as-is in snake_case.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Version tag stamped on every [`CleaningReport`].
pub const CLEANING_VERSION: &str = "4.6";

/// Version tag stamped on every [`AnalysisMeta`].
pub const ANALYSIS_VERSION: &str = "1.0";

// ============================================================================
// Cleaning
// ============================================================================

/// Outcome counters of one cleaning run.
///
/// The per-field counters are not mutually exclusive: a row with a bad email
/// and a bad phone increments both, but is dropped once. `invalid_rows_dropped`
/// holds the number of rows actually removed for failing validation, so
/// `final_rows = original_rows - duplicates_dropped - invalid_rows_dropped`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub original_rows: usize,
    pub final_rows: usize,
    pub duplicates_dropped: usize,
    pub invalid_emails_dropped: usize,
    pub invalid_phones_dropped: usize,
    pub invalid_numbers_dropped: usize,
    pub invalid_dates_dropped: usize,
    pub invalid_rows_dropped: usize,
    pub missing_required_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub cleaning_version: String,
}

impl CleaningReport {
    /// All-zero report, used for empty input.
    pub fn empty() -> Self {
        Self::with_original_rows(0)
    }

    pub(crate) fn with_original_rows(original_rows: usize) -> Self {
        Self {
            original_rows,
            final_rows: 0,
            duplicates_dropped: 0,
            invalid_emails_dropped: 0,
            invalid_phones_dropped: 0,
            invalid_numbers_dropped: 0,
            invalid_dates_dropped: 0,
            invalid_rows_dropped: 0,
            missing_required_columns: Vec::new(),
            extra_columns: Vec::new(),
            cleaning_version: CLEANING_VERSION.to_string(),
        }
    }

    /// Total rows that did not make it into the cleaned table.
    pub fn rows_removed(&self) -> usize {
        self.original_rows.saturating_sub(self.final_rows)
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Shape and missing-value signal of the analyzed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_columns: Vec<String>,
    /// Null count per column. Columns without nulls are left out.
    pub missing_values: BTreeMap<String, usize>,
    pub analysis_version: String,
}

/// Per-column descriptive aggregates over the numeric columns.
///
/// Nulls are skipped. A column with no values has no mean/min/max and a sum of 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DescriptiveStatistics {
    pub mean: BTreeMap<String, Option<f64>>,
    pub min: BTreeMap<String, Option<f64>>,
    pub max: BTreeMap<String, Option<f64>>,
    pub sum: BTreeMap<String, f64>,
}

/// Square Pearson correlation matrix, rows and columns in `columns` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `None` where the coefficient is undefined (constant column or fewer
    /// than two paired observations).
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient between two columns, if both exist and it is defined.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values.get(i)?.get(j).copied().flatten()
    }
}

/// Output of the aggregate analyzer.
///
/// An empty input table produces the default value, where every section is
/// absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<AnalysisMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<DescriptiveStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationMatrix>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.meta.is_none() && self.statistics.is_none() && self.correlation.is_none()
    }
}

// ============================================================================
// Grading
// ============================================================================

/// Coarse classification of the drop rate, used to pick the alert tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert thresholds the verdict was graded against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Drop rate (0.0 - 1.0) above which an alert is raised.
    pub drop_rate: f64,
    /// Invalid email count above which an alert is raised.
    pub invalid_emails: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            drop_rate: 0.5,
            invalid_emails: 1000,
        }
    }
}

/// Graded outcome of a cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    /// Fraction of original rows absent from the cleaned table, in [0, 1].
    pub drop_rate: f64,
    pub severity: Severity,
    pub drop_rate_exceeded: bool,
    pub invalid_emails_exceeded: bool,
    pub thresholds: AlertThresholds,
}

impl QualityVerdict {
    /// Whether any threshold was breached.
    pub fn has_alerts(&self) -> bool {
        self.drop_rate_exceeded || self.invalid_emails_exceeded
    }

    /// Drop rate as a percentage string with two decimals, e.g. `12.50%`.
    pub fn drop_rate_percent(&self) -> String {
        format!("{:.2}%", self.drop_rate * 100.0)
    }
}
