//! Employee Roster Quality Pipeline
//!
//! Validation, cleaning and data-quality grading of employee records, built
//! with Rust and Polars.
//!
//! # Overview
//!
//! - **Loading**: CSV files read as text, headers mapped through an alias table
//! - **Validation**: email, phone, salary and join-date validators
//! - **Cleaning**: header normalization, duplicate removal, row rejection with
//!   per-reason counters
//! - **Analysis**: shape, missing values, descriptive statistics and
//!   correlation over numeric columns
//! - **Grading**: drop rate, severity tier and alert thresholds
//! - **Reporting**: email placeholders, subject lines, JSON report and cleaned CSV
//! - **Progress Reporting**: stage-by-stage progress updates
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use roster_quality::{QualityConfig, QualityPipeline};
//!
//! let config = QualityConfig::builder()
//!     .client_name("Acme")
//!     .drop_rate_threshold(0.2)
//!     .build()?;
//!
//! let outcome = QualityPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run_csv("data/raw/employees.csv")?;
//!
//! println!("{} -> {} rows", outcome.summary.rows_loaded, outcome.summary.rows_cleaned);
//! println!("{}", outcome.context.subject_line());
//! ```
//!
//! # Using the stages directly
//!
//! ```rust,ignore
//! use roster_quality::{DataAnalyzer, QualityGrader, RowCleaner};
//!
//! let (cleaned, report) = RowCleaner::new().clean(&df)?;
//! let analysis = DataAnalyzer::new().analyze(&cleaned)?;
//! let verdict = QualityGrader::default().grade(&report);
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CellOutcome, FieldRule, OPTIONAL_COLUMNS, REQUIRED_COLUMNS, RowCleaner};
pub use config::{ConfigValidationError, EmailFrequency, QualityConfig, QualityConfigBuilder};
pub use error::{ErrorKind, PipelineError, Result as PipelineResult, ResultExt};
pub use loader::{LOADER_VERSION, load_csv};
pub use pipeline::{
    ClosureProgressReporter, PipelineOutcome, PipelineStage, ProgressReporter, ProgressUpdate,
    QualityPipeline, QualityPipelineBuilder,
};
pub use quality::{DataAnalyzer, QualityGrader};
pub use reporting::{PIPELINE_VERSION, QualityReport, ReportContext, ReportWriter, RunSummary};
pub use types::{
    AlertThresholds, AnalysisMeta, AnalysisResult, CleaningReport, CorrelationMatrix,
    DescriptiveStatistics, QualityVerdict, Severity,
};
