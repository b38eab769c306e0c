//! Shared utilities for the quality pipeline.
//!
//! Common helpers used by the cleaner, the analyzer and the loader.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// String Utilities
// =============================================================================

/// Formatting characters stripped from salary text before parsing.
pub const NUMERIC_FORMAT_CHARS: [char; 2] = [',', '$'];

/// Remove thousands separators and the dollar sign, then trim.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string(" $1,234.56 "), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    s.chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Canonical form of a column header: trimmed, lowercased, spaces as underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Values of a numeric Series as `f64`, with nulls and NaN mapped to `None`.
pub fn series_to_f64_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

// =============================================================================
// Tests
// =============================================================================
