//! Row-level cleaning of employee tables.
//!
//! This module provides:
//! - Header normalization and the required-column check
//! - Exact duplicate row removal
//! - Field validation with per-field invalid counters
//! - Free-text normalization of optional columns

mod converters;
mod rules;
mod sanitizers;
pub mod validators;

pub use rules::{
    CellOutcome, FieldRule, Normalized, OPTIONAL_COLUMNS, REQUIRED_COLUMNS, VALIDATED_FIELDS,
};

use crate::config::QualityConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::{PipelineStage, ProgressReporter, ProgressUpdate};
use crate::types::CleaningReport;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Validates and normalizes employee rows.
///
/// The input table is never modified; [`clean`](Self::clean) works on a copy.
pub struct RowCleaner {
    required_columns: Vec<String>,
    remove_duplicates: bool,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl Default for RowCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl RowCleaner {
    /// Cleaner with the canonical required columns and duplicate removal on.
    pub fn new() -> Self {
        Self {
            required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            remove_duplicates: true,
            progress_reporter: None,
        }
    }

    pub fn from_config(config: &QualityConfig) -> Self {
        Self {
            required_columns: config.required_columns.clone(),
            remove_duplicates: config.remove_duplicates,
            progress_reporter: None,
        }
    }

    /// Override the columns that must be present.
    pub fn required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = remove;
        self
    }

    /// Report one progress update per validated field.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(ref reporter) = self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Clean `df`, returning the retained rows and the run's counters.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::DuplicateColumns`] when two headers normalize to the
    ///   same name
    /// - [`PipelineError::MissingRequiredColumns`] when a required column is
    ///   absent; the error carries the partially filled report
    /// - [`PipelineError::CleaningFailed`] when a validated column is absent
    ///   or cannot be read
    pub fn clean(&self, df: &DataFrame) -> Result<(DataFrame, CleaningReport)> {
        if df.height() == 0 {
            debug!("Input table is empty, nothing to clean");
            return Ok((df.clone(), CleaningReport::empty()));
        }

        let mut report = CleaningReport::with_original_rows(df.height());
        let mut df = df.clone();

        sanitizers::normalize_column_names(&mut df)?;
        let present: BTreeSet<String> = df
            .get_column_names()
            .into_iter()
            .map(|c| c.to_string())
            .collect();

        let missing: Vec<String> = self
            .required_columns
            .iter()
            .filter(|c| !present.contains(c.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !missing.is_empty() {
            report.missing_required_columns = missing.clone();
            return Err(PipelineError::MissingRequiredColumns {
                missing,
                report: Box::new(report),
            });
        }

        report.extra_columns = present
            .iter()
            .filter(|c| !self.is_known_column(c))
            .cloned()
            .collect();
        if !report.extra_columns.is_empty() {
            debug!(columns = ?report.extra_columns, "Passing through extra columns");
        }

        if self.remove_duplicates {
            let (deduped, dropped) = sanitizers::drop_duplicate_rows(df)?;
            df = deduped;
            report.duplicates_dropped = dropped;
            debug!(dropped, "Removed duplicate rows");
        }

        let mut invalid_rows = vec![false; df.height()];
        let total_fields = VALIDATED_FIELDS.len();
        for (idx, (name, rule)) in VALIDATED_FIELDS.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                PipelineStage::Cleaning,
                format!("Column: {name}"),
                idx,
                total_fields,
                format!("Validating {name}"),
            ));

            let column = df.column(name).map_err(|_| PipelineError::CleaningFailed {
                column: name.to_string(),
                reason: "column is not present".to_string(),
            })?;
            let validated = converters::validate_series(column.as_materialized_series(), *rule)
                .map_err(|e| PipelineError::CleaningFailed {
                    column: name.to_string(),
                    reason: e.to_string(),
                })?;

            let count = validated.invalid_count();
            record_invalid(&mut report, *rule, count);
            debug!(column = name, invalid = count, "Validated column");

            for (row, flag) in invalid_rows.iter_mut().zip(&validated.invalid) {
                *row |= *flag;
            }
            df.replace(name, validated.series)?;
        }

        report.invalid_rows_dropped = invalid_rows.iter().filter(|&&r| r).count();
        if report.invalid_rows_dropped > 0 {
            let keep: Vec<bool> = invalid_rows.iter().map(|r| !r).collect();
            let mask = BooleanChunked::from_slice("keep".into(), &keep);
            df = df.filter(&mask)?;
        }

        sanitizers::normalize_text_columns(&mut df)?;

        report.final_rows = df.height();
        info!(
            original = report.original_rows,
            final_rows = report.final_rows,
            duplicates = report.duplicates_dropped,
            invalid = report.invalid_rows_dropped,
            "Cleaning complete"
        );

        Ok((df, report))
    }

    fn is_known_column(&self, column: &str) -> bool {
        REQUIRED_COLUMNS.contains(&column)
            || OPTIONAL_COLUMNS.contains(&column)
            || self.required_columns.iter().any(|c| c == column)
    }
}

fn record_invalid(report: &mut CleaningReport, rule: FieldRule, count: usize) {
    match rule {
        FieldRule::Email => report.invalid_emails_dropped += count,
        FieldRule::Phone => report.invalid_phones_dropped += count,
        FieldRule::Numeric => report.invalid_numbers_dropped += count,
        FieldRule::Date => report.invalid_dates_dropped += count,
        FieldRule::Text => {}
    }
}

static_assertions::assert_impl_all!(RowCleaner: Send, Sync);
