use crate::config::{EmailFrequency, QualityConfig};
use crate::error::{Result, ResultExt};
use crate::types::{AnalysisResult, CleaningReport, QualityVerdict, Severity};
use chrono::Local;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Version tag of the orchestration layer, rendered into every report.
pub const PIPELINE_VERSION: &str = "1.4";

/// Timestamp format used in artifact file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `$NAME`, `${NAME}` or the `$$` escape.
static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(\$)|([A-Za-z_][A-Za-z0-9_]*)|\{([A-Za-z_][A-Za-z0-9_]*)\})")
        .expect("valid placeholder regex")
});

// ============================================================================
// Report Context
// ============================================================================

/// Cleaning report enriched with grading, analysis highlights and client
/// settings. Every email placeholder is derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContext {
    pub client_name: String,
    pub email_frequency: EmailFrequency,
    pub rows_loaded: usize,
    pub rows_cleaned: usize,
    pub pipeline_version: String,
    /// Where the JSON quality report was written, if it was.
    pub report_path: Option<PathBuf>,
    pub mean_values: BTreeMap<String, Option<f64>>,
    pub min_values: BTreeMap<String, Option<f64>>,
    pub max_values: BTreeMap<String, Option<f64>>,
    pub cleaning: CleaningReport,
    pub verdict: QualityVerdict,
}

impl ReportContext {
    pub fn new(
        config: &QualityConfig,
        cleaning: &CleaningReport,
        analysis: &AnalysisResult,
        verdict: &QualityVerdict,
    ) -> Self {
        let stats = analysis.statistics.clone().unwrap_or_default();
        Self {
            client_name: config.client_name.clone(),
            email_frequency: config.email_frequency,
            rows_loaded: cleaning.original_rows,
            rows_cleaned: cleaning.final_rows,
            pipeline_version: PIPELINE_VERSION.to_string(),
            report_path: None,
            mean_values: stats.mean,
            min_values: stats.min,
            max_values: stats.max,
            cleaning: cleaning.clone(),
            verdict: verdict.clone(),
        }
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Placeholder name to rendered value. Every key is always present.
    pub fn placeholders(&self) -> BTreeMap<String, String> {
        let c = &self.cleaning;
        let v = &self.verdict;
        let report_path = self
            .report_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let entries: Vec<(&str, String)> = vec![
            ("CLIENT_NAME", self.client_name.clone()),
            ("EMAIL_FREQUENCY", self.email_frequency.to_string()),
            ("ROWS_LOADED", self.rows_loaded.to_string()),
            ("ROWS_CLEANED", self.rows_cleaned.to_string()),
            ("PIPELINE_VERSION", self.pipeline_version.clone()),
            ("REPORT_PATH", report_path),
            ("MEAN_VALUES", format_values(&self.mean_values)),
            ("MIN_VALUES", format_values(&self.min_values)),
            ("MAX_VALUES", format_values(&self.max_values)),
            ("DROP_RATE", v.drop_rate_percent()),
            ("SEVERITY", v.severity.to_string()),
            ("DROP_RATE_THRESHOLD", format!("{:.0}%", v.thresholds.drop_rate * 100.0)),
            ("DROP_RATE_ALERT", v.drop_rate_exceeded.to_string()),
            ("INVALID_EMAILS_THRESHOLD", v.thresholds.invalid_emails.to_string()),
            ("INVALID_EMAILS_ALERT", v.invalid_emails_exceeded.to_string()),
            ("original_rows", c.original_rows.to_string()),
            ("final_rows", c.final_rows.to_string()),
            ("duplicates_dropped", c.duplicates_dropped.to_string()),
            ("invalid_emails_dropped", c.invalid_emails_dropped.to_string()),
            ("invalid_phones_dropped", c.invalid_phones_dropped.to_string()),
            ("invalid_numbers_dropped", c.invalid_numbers_dropped.to_string()),
            ("invalid_dates_dropped", c.invalid_dates_dropped.to_string()),
            ("invalid_rows_dropped", c.invalid_rows_dropped.to_string()),
            ("missing_required_columns", c.missing_required_columns.join(", ")),
            ("extra_columns", c.extra_columns.join(", ")),
            ("cleaning_version", c.cleaning_version.clone()),
        ];

        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// Substitute `$NAME` and `${NAME}` placeholders in `template`.
    ///
    /// Unknown placeholders are left as written and logged as a warning.
    /// `$$` renders a literal `$`.
    pub fn render_template(&self, template: &str) -> String {
        let values = self.placeholders();
        let mut unresolved = BTreeSet::new();

        let rendered = PLACEHOLDER_PATTERN.replace_all(template, |caps: &Captures| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }
            let Some(name) = caps.get(2).or_else(|| caps.get(3)) else {
                return caps[0].to_string();
            };
            match values.get(name.as_str()) {
                Some(value) => value.clone(),
                None => {
                    unresolved.insert(name.as_str().to_string());
                    caps[0].to_string()
                }
            }
        });

        if !unresolved.is_empty() {
            warn!(placeholders = ?unresolved, "Template left unsubstituted placeholders");
        }
        rendered.into_owned()
    }

    /// Email subject matching the severity tier.
    pub fn subject_line(&self) -> &'static str {
        subject_for(self.verdict.severity)
    }
}

/// Email subject for a severity tier.
pub fn subject_for(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "[ACTION REQUIRED] Data Quality Alert: High Drop Rate",
        Severity::Medium => "[NOTICE] Data Quality Report: Moderate Issues",
        Severity::Low => "Data Quality Report: Clean Run",
    }
}

/// `name: value` pairs with two decimals; `n/a` for columns without values.
fn format_values(values: &BTreeMap<String, Option<f64>>) -> String {
    if values.is_empty() {
        return "n/a".to_string();
    }
    values
        .iter()
        .map(|(name, value)| match value {
            Some(v) => format!("{name}: {v:.2}"),
            None => format!("{name}: n/a"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Run Summary
// ============================================================================

/// Short result of a run, suitable for logs and `--json` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub report_path: Option<String>,
    pub rows_loaded: usize,
    pub rows_cleaned: usize,
    pub processed_path: Option<String>,
    pub timestamp: String,
    /// Drop rate as a percentage string, e.g. `12.50%`
    pub drop_rate: String,
    pub severity: Severity,
}

impl RunSummary {
    pub fn new(context: &ReportContext, processed_path: Option<&Path>, timestamp: &str) -> Self {
        Self {
            report_path: context.report_path.as_ref().map(|p| p.display().to_string()),
            rows_loaded: context.rows_loaded,
            rows_cleaned: context.rows_cleaned,
            processed_path: processed_path.map(|p| p.display().to_string()),
            timestamp: timestamp.to_string(),
            drop_rate: context.verdict.drop_rate_percent(),
            severity: context.verdict.severity,
        }
    }
}

// ============================================================================
// Report Writer
// ============================================================================

/// Complete JSON quality report written next to the cleaned table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub generated_at: String,
    pub pipeline_version: String,
    pub subject: String,
    pub context: ReportContext,
    pub analysis: AnalysisResult,
}

impl QualityReport {
    pub fn new(context: &ReportContext, analysis: &AnalysisResult) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            pipeline_version: PIPELINE_VERSION.to_string(),
            subject: context.subject_line().to_string(),
            context: context.clone(),
            analysis: analysis.clone(),
        }
    }
}

/// Paths of the files produced by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub cleaned_csv: PathBuf,
    pub report_json: PathBuf,
}

/// Writes the cleaned table and the JSON quality report.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File names for a run started at `timestamp`.
    pub fn artifact_paths(&self, timestamp: &str) -> ArtifactPaths {
        ArtifactPaths {
            cleaned_csv: self.output_dir.join(format!("cleaned_{timestamp}.csv")),
            report_json: self.output_dir.join(format!("quality_report_{timestamp}.json")),
        }
    }

    /// Write the cleaned table as CSV.
    pub fn write_cleaned(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let mut file = File::create(path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)
            .context(format!("Failed to write {}", path.display()))?;

        info!(rows = df.height(), "Cleaned data saved: {}", path.display());
        Ok(())
    }

    /// Write the quality report as pretty JSON.
    pub fn write_report(&self, report: &QualityReport, path: &Path) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Quality report saved: {}", path.display());
        Ok(())
    }

    /// Write both artifacts for a run.
    pub fn write_all(
        &self,
        cleaned: &mut DataFrame,
        report: &QualityReport,
        paths: &ArtifactPaths,
    ) -> Result<()> {
        self.write_cleaned(cleaned, &paths.cleaned_csv)?;
        self.write_report(report, &paths.report_json)?;
        debug!(dir = %self.output_dir.display(), "Artifacts written");
        Ok(())
    }
}

/// Current local time formatted for artifact names.
pub fn file_timestamp() -> String {
    Local::now().format(FILE_TIMESTAMP_FORMAT).to_string()
}
