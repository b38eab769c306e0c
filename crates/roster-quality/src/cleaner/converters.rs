//! Conversion between raw polars columns and validated output columns.

use super::rules::{CellOutcome, FieldRule, Normalized};
use super::validators::RawValue;
use polars::prelude::*;

/// A column after its validator ran on every cell.
pub(crate) struct ValidatedColumn {
    /// Normalized values; invalid and absent cells are null.
    pub series: Series,
    /// `true` at every row whose value failed validation.
    pub invalid: Vec<bool>,
}

impl ValidatedColumn {
    pub fn invalid_count(&self) -> usize {
        self.invalid.iter().filter(|&&flag| flag).count()
    }
}

/// Apply `rule` to every cell of `series`.
pub(crate) fn validate_series(series: &Series, rule: FieldRule) -> PolarsResult<ValidatedColumn> {
    let mut outcomes = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let value = series.get(i)?;
        outcomes.push(rule.apply(RawValue::from(&value)));
    }

    let invalid = outcomes.iter().map(CellOutcome::is_invalid).collect();
    let series = outcomes_to_series(series.name().clone(), rule, outcomes)?;

    Ok(ValidatedColumn { series, invalid })
}

/// Build the output column for `rule` from per-cell outcomes.
pub(crate) fn outcomes_to_series(
    name: PlSmallStr,
    rule: FieldRule,
    outcomes: Vec<CellOutcome>,
) -> PolarsResult<Series> {
    match rule.output_dtype() {
        DataType::Float64 => {
            let values: Vec<Option<f64>> = outcomes
                .into_iter()
                .map(|outcome| match outcome {
                    CellOutcome::Valid(Normalized::Number(n)) => Some(n),
                    _ => None,
                })
                .collect();
            Ok(Series::new(name, values))
        }
        DataType::Datetime(unit, tz) => {
            let millis: Vec<Option<i64>> = outcomes
                .into_iter()
                .map(|outcome| match outcome {
                    CellOutcome::Valid(Normalized::Timestamp(dt)) => {
                        Some(dt.and_utc().timestamp_millis())
                    }
                    _ => None,
                })
                .collect();
            Series::new(name, millis).cast(&DataType::Datetime(unit, tz))
        }
        _ => {
            let values: Vec<Option<String>> = outcomes
                .into_iter()
                .map(|outcome| match outcome {
                    CellOutcome::Valid(Normalized::Text(s)) => Some(s),
                    _ => None,
                })
                .collect();
            Ok(Series::new(name, values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_null_at(series: &Series, idx: usize) -> bool {
        matches!(series.get(idx).unwrap(), AnyValue::Null)
    }

    #[test]
    fn test_validate_email_column() {
        let series = Series::new(
            "email".into(),
            &[Some("A@B.com"), Some("bad"), None, Some(" c@d.org ")],
        );
        let validated = validate_series(&series, FieldRule::Email).unwrap();

        assert_eq!(validated.invalid, vec![false, true, true, false]);
        assert_eq!(validated.invalid_count(), 2);
        assert_eq!(validated.series.dtype(), &DataType::String);
        assert_eq!(
            validated.series.str().unwrap().get(0),
            Some("a@b.com")
        );
        assert!(is_null_at(&validated.series, 1));
        assert_eq!(validated.series.str().unwrap().get(3), Some("c@d.org"));
    }

    #[test]
    fn test_validate_salary_from_numbers() {
        let series = Series::new("salary".into(), &[Some(50_000i64), Some(-1), None]);
        let validated = validate_series(&series, FieldRule::Numeric).unwrap();

        assert_eq!(validated.invalid, vec![false, true, true]);
        assert_eq!(validated.series.dtype(), &DataType::Float64);
        assert_eq!(validated.series.f64().unwrap().get(0), Some(50_000.0));
    }

    #[test]
    fn test_validate_dates_produces_datetime_column() {
        let series = Series::new("date_joined".into(), &["2023-01-15", "never"]);
        let validated = validate_series(&series, FieldRule::Date).unwrap();

        assert_eq!(validated.invalid, vec![false, true]);
        assert!(matches!(
            validated.series.dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        assert!(!is_null_at(&validated.series, 0));
        assert!(is_null_at(&validated.series, 1));
    }

    #[test]
    fn test_text_column_never_invalid() {
        let series = Series::new("notes".into(), &[Some("  hi "), Some(""), None]);
        let validated = validate_series(&series, FieldRule::Text).unwrap();

        assert_eq!(validated.invalid_count(), 0);
        assert_eq!(validated.series.str().unwrap().get(0), Some("hi"));
        assert!(is_null_at(&validated.series, 1));
        assert!(is_null_at(&validated.series, 2));
    }
}
