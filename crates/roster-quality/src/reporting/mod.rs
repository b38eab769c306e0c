//! Report context, template rendering and artifact writing.
//!
//! # Example
//!
//! ```rust,ignore
//! use roster_quality::reporting::{ReportContext, ReportWriter, QualityReport};
//!
//! let context = ReportContext::new(&config, &cleaning, &analysis, &verdict);
//! let body = context.render_template("Hello $CLIENT_NAME, drop rate $DROP_RATE");
//! let subject = context.subject_line();
//!
//! let writer = ReportWriter::new("data/processed");
//! let paths = writer.artifact_paths(&file_timestamp());
//! writer.write_all(&mut cleaned, &QualityReport::new(&context, &analysis), &paths)?;
//! ```

mod generator;

pub use generator::{
    ArtifactPaths, FILE_TIMESTAMP_FORMAT, PIPELINE_VERSION, QualityReport, ReportContext,
    ReportWriter, RunSummary, file_timestamp, subject_for,
};
