//! Table-level sanitization: header normalization, duplicate rows and free text.

use super::converters::validate_series;
use super::rules::FieldRule;
use crate::error::{PipelineError, Result};
use crate::utils::normalize_column_name;
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Rename every column to its canonical form.
///
/// Fails when two source headers collapse to the same name, e.g. `Email` and
/// ` email `.
pub(crate) fn normalize_column_names(df: &mut DataFrame) -> Result<()> {
    let normalized: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| normalize_column_name(name))
        .collect();

    let mut seen = HashSet::with_capacity(normalized.len());
    let duplicates: BTreeSet<&String> = normalized
        .iter()
        .filter(|name| !seen.insert(name.as_str()))
        .collect();
    if !duplicates.is_empty() {
        return Err(PipelineError::DuplicateColumns(
            duplicates.into_iter().cloned().collect(),
        ));
    }

    df.set_column_names(normalized)?;
    Ok(())
}

/// Drop exact duplicate rows, keeping the first occurrence in original order.
/// Returns the filtered table and the number removed.
///
/// Rows are compared by value across all columns, with nulls equal to each other.
pub(crate) fn drop_duplicate_rows(df: DataFrame) -> PolarsResult<(DataFrame, usize)> {
    let before = df.height();
    let deduped = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let dropped = before - deduped.height();
    Ok((deduped, dropped))
}

/// Trim every column whose rule is free text, turning blank values into nulls.
///
/// Returns the number of columns normalized.
pub(crate) fn normalize_text_columns(df: &mut DataFrame) -> PolarsResult<usize> {
    let text_columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| FieldRule::for_column(name.as_str()) == Some(FieldRule::Text))
        .map(|name| name.to_string())
        .collect();

    for name in &text_columns {
        let validated = validate_series(df.column(name)?.as_materialized_series(), FieldRule::Text)?;
        df.replace(name, validated.series)?;
    }

    debug!(columns = text_columns.len(), "Normalized free-text columns");
    Ok(text_columns.len())
}
