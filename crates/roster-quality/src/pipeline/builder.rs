//! Quality pipeline orchestration.
//!
//! This module provides the [`QualityPipeline`] struct and its builder, which
//! run clean -> analyze -> grade -> report over one employee table.

use crate::cleaner::RowCleaner;
use crate::config::{ConfigValidationError, QualityConfig};
use crate::error::Result;
use crate::loader;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::quality::{DataAnalyzer, QualityGrader};
use crate::reporting::{QualityReport, ReportContext, ReportWriter, RunSummary, file_timestamp};
use crate::types::{AnalysisResult, CleaningReport, QualityVerdict};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub cleaned: DataFrame,
    pub cleaning: CleaningReport,
    pub analysis: AnalysisResult,
    pub verdict: QualityVerdict,
    pub context: ReportContext,
    pub summary: RunSummary,
}

/// The quality pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use roster_quality::{QualityConfig, QualityPipeline};
///
/// let outcome = QualityPipeline::builder()
///     .config(QualityConfig::builder().save_to_disk(false).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run(df)?;
///
/// println!("{}", outcome.context.subject_line());
/// ```
pub struct QualityPipeline {
    config: QualityConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: RowCleaner,
    analyzer: DataAnalyzer,
    grader: QualityGrader,
    writer: ReportWriter,
}

// Each run owns its table, so a pipeline can be handed to a worker thread
static_assertions::assert_impl_all!(QualityPipeline: Send);
static_assertions::assert_impl_all!(PipelineOutcome: Send);

impl QualityPipeline {
    pub fn builder() -> QualityPipelineBuilder {
        QualityPipelineBuilder::default()
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Run the pipeline over an already loaded table.
    ///
    /// # Errors
    ///
    /// Schema, cleaning and analysis errors are fatal and propagate after a
    /// [`PipelineStage::Failed`] update. A high drop rate is not an error; it
    /// is reflected in the verdict.
    pub fn run(&self, df: DataFrame) -> Result<PipelineOutcome> {
        self.finish(self.run_internal(df))
    }

    /// Load `path` with the CSV loader, then [`run`](Self::run) it.
    pub fn run_csv(&self, path: impl AsRef<Path>) -> Result<PipelineOutcome> {
        let path = path.as_ref();
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}", path.display()),
        ));

        match loader::load_csv(path) {
            Ok(df) => self.run(df),
            Err(e) => self.finish(Err(e)),
        }
    }

    fn finish(&self, result: Result<PipelineOutcome>) -> Result<PipelineOutcome> {
        match result {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete("Quality run completed"));
                Ok(outcome)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!(code = e.error_code(), "Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, df: DataFrame) -> Result<PipelineOutcome> {
        let start_time = Instant::now();
        info!(rows = df.height(), cols = df.width(), "Starting quality pipeline");

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            0.0,
            "Validating rows",
        ));
        let (mut cleaned, cleaning) = self.cleaner.clean(&df)?;
        drop(df);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Analysis,
            0.0,
            "Computing aggregates",
        ));
        let analysis = self.analyzer.analyze(&cleaned)?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Grading,
            0.0,
            "Grading cleaning outcome",
        ));
        let verdict = self.grader.grade(&cleaning);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Reporting,
            0.0,
            "Building report",
        ));
        let timestamp = file_timestamp();
        let mut context = ReportContext::new(&self.config, &cleaning, &analysis, &verdict);
        let mut processed_path: Option<PathBuf> = None;

        if self.config.save_to_disk {
            let paths = self.writer.artifact_paths(&timestamp);
            context = context.with_report_path(&paths.report_json);
            let report = QualityReport::new(&context, &analysis);
            self.writer.write_all(&mut cleaned, &report, &paths)?;
            processed_path = Some(paths.cleaned_csv);
        } else {
            debug!("save_to_disk disabled, skipping artifact output");
        }

        let summary = RunSummary::new(&context, processed_path.as_deref(), &timestamp);
        info!(
            rows_loaded = summary.rows_loaded,
            rows_cleaned = summary.rows_cleaned,
            drop_rate = %summary.drop_rate,
            severity = %summary.severity,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Pipeline completed"
        );

        Ok(PipelineOutcome {
            cleaned,
            cleaning,
            analysis,
            verdict,
            context,
            summary,
        })
    }
}

/// Builder for [`QualityPipeline`].
#[derive(Default)]
pub struct QualityPipelineBuilder {
    config: Option<QualityConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(QualityPipelineBuilder: Send);

impl QualityPipelineBuilder {
    pub fn config(mut self, config: QualityConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<QualityPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let mut cleaner = RowCleaner::from_config(&config);
        if let Some(reporter) = &self.progress_reporter {
            cleaner = cleaner.with_reporter(reporter.clone());
        }

        Ok(QualityPipeline {
            analyzer: DataAnalyzer::from_config(&config),
            grader: QualityGrader::from_config(&config),
            writer: ReportWriter::new(config.output_dir.clone()),
            cleaner,
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use std::sync::Mutex;

    fn roster() -> DataFrame {
        df! {
            "id" => ["1", "2", "3", "4"],
            "name" => ["Ann", "Bob", "Cid", "Dee"],
            "email" => ["ann@corp.com", "bob@corp.com", "not-an-email", "dee@corp.com"],
            "phone" => ["+1 555 010 0001", "555-010-0002", "555-010-0003", "555-010-0004"],
            "salary" => ["50,000", "$60000", "70000", "80000"],
            "date_joined" => ["2023-01-15", "01/20/2023", "2023-02-01", "15 March 2023"],
        }
        .unwrap()
    }

    fn in_memory() -> QualityConfig {
        QualityConfig::builder().save_to_disk(false).build().unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = QualityPipeline::builder().build().unwrap();
        assert!(pipeline.progress_reporter.is_none());
        assert!(pipeline.config().save_to_disk);
    }

    #[test]
    fn test_run_in_memory() {
        let pipeline = QualityPipeline::builder().config(in_memory()).build().unwrap();
        let outcome = pipeline.run(roster()).unwrap();

        assert_eq!(outcome.cleaning.original_rows, 4);
        assert_eq!(outcome.cleaning.final_rows, 3);
        assert_eq!(outcome.cleaned.height(), 3);
        assert_eq!(outcome.verdict.severity, Severity::Medium);
        assert_eq!(outcome.summary.drop_rate, "25.00%");
        assert_eq!(outcome.summary.report_path, None);
        assert_eq!(outcome.summary.processed_path, None);
        assert_eq!(
            outcome.analysis.meta.as_ref().unwrap().numeric_columns,
            vec!["salary"]
        );
        assert_eq!(
            outcome.context.subject_line(),
            "[NOTICE] Data Quality Report: Moderate Issues"
        );
    }

    #[test]
    fn test_progress_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        QualityPipeline::builder()
            .config(in_memory())
            .on_progress(move |update| {
                stages_clone.lock().unwrap().push(update.stage);
            })
            .build()
            .unwrap()
            .run(roster())
            .unwrap();

        let mut seen = stages.lock().unwrap().clone();
        seen.dedup();
        assert_eq!(
            seen,
            vec![
                PipelineStage::Cleaning,
                PipelineStage::Analysis,
                PipelineStage::Grading,
                PipelineStage::Reporting,
                PipelineStage::Complete,
            ]
        );
    }

    #[test]
    fn test_fatal_error_reports_failed() {
        let last = Arc::new(Mutex::new(None));
        let last_clone = last.clone();

        let pipeline = QualityPipeline::builder()
            .config(in_memory())
            .on_progress(move |update| {
                *last_clone.lock().unwrap() = Some(update.stage);
            })
            .build()
            .unwrap();

        let df = roster().drop("phone").unwrap();
        let err = pipeline.run(df).unwrap_err();

        assert_eq!(err.error_code(), "LOAD_MISSING_COLUMNS");
        assert_eq!(*last.lock().unwrap(), Some(PipelineStage::Failed));
    }

    #[test]
    fn test_missing_csv_is_io_error() {
        let pipeline = QualityPipeline::builder().config(in_memory()).build().unwrap();
        let err = pipeline.run_csv("definitely/not/here.csv").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let mut config = QualityConfig::default();
        config.drop_rate_threshold = -0.1;
        assert!(QualityPipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_run_writes_artifacts() {
        let dir = std::env::temp_dir().join(format!("roster_quality_pipeline_{}", std::process::id()));
        let config = QualityConfig::builder().output_dir(&dir).build().unwrap();
        let outcome = QualityPipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .run(roster())
            .unwrap();

        let report_path = outcome.summary.report_path.clone().unwrap();
        let processed_path = outcome.summary.processed_path.clone().unwrap();
        assert!(Path::new(&report_path).exists());
        assert!(Path::new(&processed_path).exists());
        assert!(report_path.contains(&format!("quality_report_{}", outcome.summary.timestamp)));
        assert_eq!(
            outcome.context.placeholders()["REPORT_PATH"],
            report_path
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
