//! Error types for the employee-record quality pipeline.
//!
//! Only structural failures live here. A single row failing a field validator
//! is never an error: it is counted in the [`CleaningReport`] and dropped.
//!
//! Errors are serializable as `{ code, kind, message }` so an orchestrator can forward
//! them to an alerting channel unchanged.

use crate::config::ConfigValidationError;
use crate::types::CleaningReport;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Coarse classification of fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The table does not have the shape the cleaner expects.
    Schema,
    /// Validation could not be carried out on a column.
    Cleaning,
    /// The analyzer was asked for columns that do not exist.
    Analysis,
    /// Invalid configuration.
    Config,
    /// Filesystem or encoding failure in a collaborator.
    Io,
    /// Anything coming from polars or serde that does not fit above.
    Internal,
}

/// The main error type for the quality pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// One or more required columns are absent after name normalization.
    ///
    /// The partially filled report is kept so the failure can still be logged
    /// with its `missing_required_columns` field.
    #[error("Missing required columns: {missing:?}")]
    MissingRequiredColumns {
        missing: Vec<String>,
        report: Box<CleaningReport>,
    },

    /// Two source columns collapse to the same name after normalization.
    #[error("Duplicate column names after normalization: {0:?}")]
    DuplicateColumns(Vec<String>),

    /// A column expected for validation could not be processed.
    #[error("Failed to clean column '{column}': {reason}")]
    CleaningFailed { column: String, reason: String },

    /// The numeric allowlist names columns that are not in the table.
    #[error("Missing numeric columns: {0:?}")]
    MissingNumericColumns(Vec<String>),

    /// Analysis stage failed.
    #[error("Analysis stage failed: {0}")]
    AnalysisFailed(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl From<ConfigValidationError> for PipelineError {
    fn from(err: ConfigValidationError) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for logs and alert payloads.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRequiredColumns { .. } => "LOAD_MISSING_COLUMNS",
            Self::DuplicateColumns(_) => "LOAD_DUPLICATE_COLUMNS",
            Self::CleaningFailed { .. } => "CLEANING_FAILED",
            Self::MissingNumericColumns(_) => "ANALYSIS_MISSING_COLUMNS",
            Self::AnalysisFailed(_) => "ANALYSIS_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Which stage of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRequiredColumns { .. } | Self::DuplicateColumns(_) => ErrorKind::Schema,
            Self::CleaningFailed { .. } => ErrorKind::Cleaning,
            Self::MissingNumericColumns(_) | Self::AnalysisFailed(_) => ErrorKind::Analysis,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Polars(_) | Self::Json(_) => ErrorKind::Internal,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Check if this error can be fixed by the caller and the run retried
    /// without touching the data.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config)
    }

    /// Missing required columns, if this is a schema failure of that kind.
    pub fn missing_columns(&self) -> Option<&[String]> {
        match self {
            Self::MissingRequiredColumns { missing, .. } => Some(missing),
            Self::MissingNumericColumns(missing) => Some(missing),
            Self::WithContext { source, .. } => source.missing_columns(),
            _ => None,
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_phone() -> PipelineError {
        let mut report = CleaningReport::empty();
        report.missing_required_columns = vec!["phone".to_string()];
        PipelineError::MissingRequiredColumns {
            missing: vec!["phone".to_string()],
            report: Box::new(report),
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(missing_phone().error_code(), "LOAD_MISSING_COLUMNS");
        assert_eq!(
            PipelineError::MissingNumericColumns(vec!["bonus".to_string()]).error_code(),
            "ANALYSIS_MISSING_COLUMNS"
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(missing_phone().kind(), ErrorKind::Schema);
        assert_eq!(
            PipelineError::CleaningFailed {
                column: "email".to_string(),
                reason: "not found".to_string()
            }
            .kind(),
            ErrorKind::Cleaning
        );
        assert_eq!(
            PipelineError::AnalysisFailed("boom".to_string()).kind(),
            ErrorKind::Analysis
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(!missing_phone().is_recoverable());
        assert!(PipelineError::InvalidConfig("bad".to_string()).is_recoverable());
    }

    #[test]
    fn test_config_error_converts_to_recoverable() {
        let lookup = |key: &str| (key == "ALERT_DROP_RATE").then(|| "1.5".to_string());
        let err: PipelineError = crate::config::QualityConfig::from_lookup(lookup)
            .unwrap_err()
            .into();

        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("drop_rate_threshold"));
    }

    #[test]
    fn test_missing_columns_accessor() {
        let error = missing_phone().with_context("During cleaning");
        assert_eq!(error.missing_columns(), Some(&["phone".to_string()][..]));
        assert!(PipelineError::AnalysisFailed("x".to_string())
            .missing_columns()
            .is_none());
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&missing_phone()).unwrap();
        assert!(json.contains("LOAD_MISSING_COLUMNS"));
        assert!(json.contains("\"schema\""));
        assert!(json.contains("phone"));
    }

    #[test]
    fn test_with_context() {
        let error = PipelineError::MissingNumericColumns(vec!["bonus".to_string()])
            .with_context("During analysis");
        assert!(error.to_string().contains("During analysis"));
        assert_eq!(error.error_code(), "ANALYSIS_MISSING_COLUMNS");
        assert_eq!(error.kind(), ErrorKind::Analysis);
    }
}
