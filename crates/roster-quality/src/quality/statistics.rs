//! Null-skipping aggregates and Pearson correlation over `f64` columns.

use crate::types::CorrelationMatrix;
use polars::prelude::*;

/// Descriptive aggregates of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ColumnSummary {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
}

/// Mean, min, max and sum of the present values, via the polars aggregates.
///
/// A column without values has no mean/min/max and a sum of 0.
pub(crate) fn summarize(values: &[Option<f64>]) -> PolarsResult<ColumnSummary> {
    let series = Series::new(PlSmallStr::EMPTY, values);
    Ok(ColumnSummary {
        mean: series.mean(),
        min: series.min::<f64>()?,
        max: series.max::<f64>()?,
        sum: series.sum::<f64>()?,
    })
}

/// Pearson coefficient over rows where both values are present.
///
/// `None` with fewer than two paired rows or when either side is constant.
pub(crate) fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Square matrix of pairwise coefficients, in the order given.
pub(crate) fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}
