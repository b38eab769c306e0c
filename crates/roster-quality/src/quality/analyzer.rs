use super::statistics::{self, ColumnSummary};
use crate::config::QualityConfig;
use crate::error::{PipelineError, Result, ResultExt};
use crate::types::{
    ANALYSIS_VERSION, AnalysisMeta, AnalysisResult, CorrelationMatrix, DescriptiveStatistics,
};
use crate::utils::{is_numeric_dtype, series_to_f64_values};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Correlation is computed only for this many numeric columns.
const CORRELATION_COLUMN_RANGE: std::ops::RangeInclusive<usize> = 2..=10;

/// Aggregate analyzer over a cleaned table.
#[derive(Debug, Clone, Default)]
pub struct DataAnalyzer {
    numeric_columns: Option<Vec<String>>,
}

impl DataAnalyzer {
    /// Analyzer over every numeric column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the analysis to `columns`, in that order. An empty list
    /// means no restriction.
    pub fn with_numeric_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        Self {
            numeric_columns: (!columns.is_empty()).then_some(columns),
        }
    }

    pub fn from_config(config: &QualityConfig) -> Self {
        Self {
            numeric_columns: config.numeric_columns.clone().filter(|c| !c.is_empty()),
        }
    }

    /// Compute shape, missing values, statistics and correlation for `df`.
    ///
    /// An empty table produces an empty result.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingNumericColumns`] when the allowlist names
    /// columns that are not in the table.
    pub fn analyze(&self, df: &DataFrame) -> Result<AnalysisResult> {
        if df.height() == 0 {
            debug!("Analysis skipped for empty table");
            return Ok(AnalysisResult::default());
        }

        let numeric = self.select_numeric_columns(df)?;
        let meta = AnalysisMeta {
            row_count: df.height(),
            column_count: df.width(),
            numeric_columns: numeric.clone(),
            missing_values: missing_values(df),
            analysis_version: ANALYSIS_VERSION.to_string(),
        };

        let mut result = AnalysisResult {
            meta: Some(meta),
            ..Default::default()
        };

        if !numeric.is_empty() {
            let values = numeric_values(df, &numeric).context("Failed to read numeric columns")?;
            result.statistics = Some(describe(&values).context("Failed to aggregate numeric columns")?);

            if CORRELATION_COLUMN_RANGE.contains(&numeric.len()) {
                result.correlation = match correlate(&values) {
                    Ok(matrix) => Some(matrix),
                    Err(e) => {
                        warn!(error = %e, "Correlation matrix omitted");
                        None
                    }
                };
            } else {
                debug!(numeric = numeric.len(), "Correlation skipped");
            }
        }

        info!(
            rows = df.height(),
            cols = df.width(),
            numeric = numeric.len(),
            correlation = result.correlation.is_some(),
            "Analysis complete"
        );
        Ok(result)
    }

    /// Numeric columns to analyze, in allowlist order or table order.
    fn select_numeric_columns(&self, df: &DataFrame) -> Result<Vec<String>> {
        let candidates: Vec<String> = match &self.numeric_columns {
            Some(allowlist) => {
                let present: BTreeSet<&str> =
                    df.get_column_names().into_iter().map(|c| c.as_str()).collect();
                let missing: BTreeSet<String> = allowlist
                    .iter()
                    .filter(|c| !present.contains(c.as_str()))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    return Err(PipelineError::MissingNumericColumns(
                        missing.into_iter().collect(),
                    ));
                }
                allowlist.clone()
            }
            None => df
                .get_column_names()
                .into_iter()
                .map(|c| c.to_string())
                .collect(),
        };

        let mut numeric = Vec::with_capacity(candidates.len());
        for name in candidates {
            if numeric.contains(&name) {
                continue;
            }
            let column = df.column(&name)?;
            if is_numeric_dtype(column.dtype()) {
                numeric.push(name);
            } else if self.numeric_columns.is_some() {
                debug!(column = %name, dtype = ?column.dtype(), "Allowlisted column is not numeric");
            }
        }
        Ok(numeric)
    }
}

/// Null count per column, leaving out columns without nulls.
fn missing_values(df: &DataFrame) -> BTreeMap<String, usize> {
    df.get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| (c.name().to_string(), c.null_count()))
        .collect()
}

fn numeric_values(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<(String, Vec<Option<f64>>)>> {
    columns
        .iter()
        .map(|name| {
            let series = df.column(name)?.as_materialized_series();
            Ok((name.clone(), series_to_f64_values(series)?))
        })
        .collect()
}

/// Pairwise correlation, refusing columns of unequal length.
fn correlate(values: &[(String, Vec<Option<f64>>)]) -> Result<CorrelationMatrix> {
    if let Some((first, rest)) = values.split_first()
        && let Some((name, _)) = rest.iter().find(|(_, v)| v.len() != first.1.len())
    {
        return Err(PipelineError::AnalysisFailed(format!(
            "column '{name}' has a different length than '{}'",
            first.0
        )));
    }
    Ok(statistics::correlation_matrix(values))
}

fn describe(values: &[(String, Vec<Option<f64>>)]) -> PolarsResult<DescriptiveStatistics> {
    let mut stats = DescriptiveStatistics::default();
    for (name, column) in values {
        insert_summary(&mut stats, name, statistics::summarize(column)?);
    }
    Ok(stats)
}

fn insert_summary(stats: &mut DescriptiveStatistics, name: &str, summary: ColumnSummary) {
    stats.mean.insert(name.to_string(), summary.mean);
    stats.min.insert(name.to_string(), summary.min);
    stats.max.insert(name.to_string(), summary.max);
    stats.sum.insert(name.to_string(), summary.sum);
}
