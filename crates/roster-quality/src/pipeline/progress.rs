//! Progress reporting for the quality pipeline.
//!
//! The pipeline never owns a logger or a UI; callers inject a
//! [`ProgressReporter`] and receive one [`ProgressUpdate`] per notable step.
//!
//! # Example
//!
//! ```rust,ignore
//! use roster_quality::QualityPipeline;
//!
//! let outcome = QualityPipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run(df)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a quality run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the source file
    Loading,
    /// Validating rows and dropping invalid ones
    Cleaning,
    /// Computing aggregates over the cleaned table
    Analysis,
    /// Grading the cleaning outcome against thresholds
    Grading,
    /// Building the report context and writing artifacts
    Reporting,
    /// Run completed successfully
    Complete,
    /// Run failed with a fatal error
    Failed,
}

impl PipelineStage {
    /// Human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Cleaning => "Cleaning Rows",
            Self::Analysis => "Analyzing Data",
            Self::Grading => "Grading Quality",
            Self::Reporting => "Building Report",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run taken by this stage (0.0 - 1.0).
    ///
    /// The non-terminal stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Cleaning => 0.50,
            Self::Analysis => 0.20,
            Self::Grading => 0.05,
            Self::Reporting => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Cleaning => 0.10,
            Self::Analysis => 0.60,
            Self::Grading => 0.80,
            Self::Reporting => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,

    /// Finer-grained location inside the stage, e.g. `Column: email`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    fn build(
        stage: PipelineStage,
        sub_stage: Option<String>,
        stage_progress: f32,
        message: String,
    ) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            sub_stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message,
            items_processed: None,
            items_total: None,
        }
    }

    /// Update for a stage without sub-stage info.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        Self::build(stage, None, stage_progress, message.into())
    }

    /// Update for one item of an iterative step, e.g. one validated column.
    pub fn with_items(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::build(stage, Some(sub_stage.into()), stage_progress, message.into())
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::build(PipelineStage::Complete, None, 1.0, message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::build(PipelineStage::Failed, None, 0.0, message.into())
    }
}

/// Receiver of progress updates.
///
/// Implementations must be `Send + Sync` so a run can be moved to a worker
/// thread while the reporter forwards updates elsewhere. `report` may be
/// called once per validated column; keep it cheap.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_impl_all!(PipelineStage: Send, Sync);
