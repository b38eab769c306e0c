//! Canonical employee schema and the field-to-validator mapping.

use super::validators::{self, RawValue};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Columns every input table must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = ["id", "name", "email", "phone", "salary", "date_joined"];

/// Known columns that may be absent. Present ones get free-text normalization.
pub const OPTIONAL_COLUMNS: [&str; 10] = [
    "department",
    "notes",
    "position",
    "location",
    "status",
    "manager",
    "dob",
    "gender",
    "contract_type",
    "last_updated",
];

/// Validator capability attached to a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRule {
    Email,
    Phone,
    Numeric,
    Date,
    Text,
}

/// Fields whose failure invalidates the whole row, in evaluation order.
pub const VALIDATED_FIELDS: [(&str, FieldRule); 4] = [
    ("email", FieldRule::Email),
    ("phone", FieldRule::Phone),
    ("salary", FieldRule::Numeric),
    ("date_joined", FieldRule::Date),
];

/// A value that passed its validator.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Text(String),
    Number(f64),
    Timestamp(NaiveDateTime),
}

/// Result of applying a [`FieldRule`] to one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    Valid(Normalized),
    /// The value failed validation; the row will be dropped.
    Invalid,
    /// No value, and none is required (optional text fields only).
    Absent,
}

impl CellOutcome {
    pub fn is_invalid(&self) -> bool {
        matches!(self, CellOutcome::Invalid)
    }
}

impl FieldRule {
    /// Rule for a canonical column, if it has one.
    pub fn for_column(column: &str) -> Option<Self> {
        VALIDATED_FIELDS
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, rule)| *rule)
            .or_else(|| OPTIONAL_COLUMNS.contains(&column).then_some(FieldRule::Text))
    }

    /// Whether a failure under this rule invalidates the row.
    pub fn rejects_rows(&self) -> bool {
        !matches!(self, FieldRule::Text)
    }

    /// Column type of the cleaned output.
    pub fn output_dtype(&self) -> DataType {
        match self {
            FieldRule::Email | FieldRule::Phone | FieldRule::Text => DataType::String,
            FieldRule::Numeric => DataType::Float64,
            FieldRule::Date => DataType::Datetime(TimeUnit::Milliseconds, None),
        }
    }

    /// Run the validator for this rule.
    pub fn apply(&self, raw: RawValue<'_>) -> CellOutcome {
        let normalized = match self {
            FieldRule::Email => validators::email(raw).map(Normalized::Text),
            FieldRule::Phone => validators::phone(raw).map(Normalized::Text),
            FieldRule::Numeric => validators::numeric(raw).map(Normalized::Number),
            FieldRule::Date => validators::date(raw).map(Normalized::Timestamp),
            FieldRule::Text => validators::text(raw).map(Normalized::Text),
        };
        match (normalized, self.rejects_rows()) {
            (Some(value), _) => CellOutcome::Valid(value),
            (None, true) => CellOutcome::Invalid,
            (None, false) => CellOutcome::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_column() {
        assert_eq!(FieldRule::for_column("email"), Some(FieldRule::Email));
        assert_eq!(FieldRule::for_column("salary"), Some(FieldRule::Numeric));
        assert_eq!(FieldRule::for_column("notes"), Some(FieldRule::Text));
        assert_eq!(FieldRule::for_column("id"), None);
        assert_eq!(FieldRule::for_column("favourite_colour"), None);
    }

    #[test]
    fn test_validated_fields_are_required() {
        for (name, rule) in VALIDATED_FIELDS {
            assert!(REQUIRED_COLUMNS.contains(&name));
            assert!(rule.rejects_rows());
        }
    }

    #[test]
    fn test_apply_outcomes() {
        assert_eq!(
            FieldRule::Numeric.apply(RawValue::Text("1,000")),
            CellOutcome::Valid(Normalized::Number(1000.0))
        );
        assert!(FieldRule::Email.apply(RawValue::Text("nope")).is_invalid());
        assert_eq!(FieldRule::Text.apply(RawValue::Text("  ")), CellOutcome::Absent);
        assert_eq!(
            FieldRule::Text.apply(RawValue::Text(" HR ")),
            CellOutcome::Valid(Normalized::Text("HR".to_string()))
        );
    }

    #[test]
    fn test_output_dtypes() {
        assert_eq!(FieldRule::Phone.output_dtype(), DataType::String);
        assert_eq!(FieldRule::Numeric.output_dtype(), DataType::Float64);
        assert!(matches!(
            FieldRule::Date.output_dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
    }
}
