//! Pipeline module.
//!
//! This module provides the quality pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{PipelineOutcome, QualityPipeline, QualityPipelineBuilder};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
