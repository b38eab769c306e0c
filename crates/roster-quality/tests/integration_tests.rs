//! Integration tests for the employee-record quality pipeline.
//!
//! These tests run the loader, cleaner, analyzer, grader and report writer end
//! to end over the CSV fixtures.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use roster_quality::{
    DataAnalyzer, PipelineError, PipelineStage, QualityConfig, QualityGrader, QualityPipeline,
    QualityReport, RowCleaner, Severity, load_csv,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(filename: &str) -> PathBuf {
    fixtures_path().join(filename)
}

fn in_memory_pipeline() -> QualityPipeline {
    QualityPipeline::builder()
        .config(QualityConfig::builder().save_to_disk(false).build().unwrap())
        .build()
        .unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("roster_quality_it_{}_{}", name, std::process::id()))
}

// ============================================================================
// Loader
// ============================================================================

#[test]
fn test_loader_maps_aliases() {
    let df = load_csv(fixture("employees.csv")).unwrap();

    let names: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "id",
            "name",
            "email",
            "phone",
            "salary",
            "date_joined",
            "department",
            "notes",
            "shift"
        ]
    );
    assert_eq!(df.height(), 10);
}

#[test]
fn test_loader_missing_file() {
    let err = load_csv(fixture("does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_full_pipeline_employees() {
    let outcome = in_memory_pipeline()
        .run_csv(fixture("employees.csv"))
        .unwrap();

    let cleaning = &outcome.cleaning;
    assert_eq!(cleaning.original_rows, 10);
    assert_eq!(cleaning.duplicates_dropped, 1);
    assert_eq!(cleaning.invalid_emails_dropped, 1);
    assert_eq!(cleaning.invalid_phones_dropped, 1);
    assert_eq!(cleaning.invalid_numbers_dropped, 1);
    assert_eq!(cleaning.invalid_dates_dropped, 1);
    assert_eq!(cleaning.invalid_rows_dropped, 4);
    assert_eq!(cleaning.final_rows, 5);
    assert_eq!(cleaning.extra_columns, vec!["shift"]);
    assert!(cleaning.missing_required_columns.is_empty());

    assert_eq!(outcome.cleaned.height(), 5);
    let ids: Vec<Option<&str>> = outcome.cleaned.column("id").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(ids, vec![Some("1"), Some("2"), Some("7"), Some("9"), Some("10")]);

    // Normalized values
    let emails = outcome.cleaned.column("email").unwrap().str().unwrap().clone();
    assert_eq!(emails.get(1), Some("bob@corp.com"));
    let phones = outcome.cleaned.column("phone").unwrap().str().unwrap().clone();
    assert_eq!(phones.get(0), Some("+15550100001"));
    assert_eq!(phones.get(3), Some("5550100009"));
    let departments = outcome.cleaned.column("department").unwrap().str().unwrap().clone();
    assert_eq!(departments.get(0), Some("HR"));
    assert_eq!(departments.get(2), None);

    // Half of the rows were removed: HIGH, but not above the 0.5 alert threshold
    assert_eq!(outcome.verdict.drop_rate, 0.5);
    assert_eq!(outcome.verdict.severity, Severity::High);
    assert!(!outcome.verdict.drop_rate_exceeded);
    assert_eq!(outcome.summary.drop_rate, "50.00%");
}

#[test]
fn test_full_pipeline_statistics() {
    let outcome = in_memory_pipeline()
        .run_csv(fixture("employees.csv"))
        .unwrap();

    let meta = outcome.analysis.meta.as_ref().unwrap();
    assert_eq!(meta.row_count, 5);
    assert_eq!(meta.numeric_columns, vec!["salary"]);

    let stats = outcome.analysis.statistics.as_ref().unwrap();
    assert_eq!(stats.mean["salary"], Some(61000.0));
    assert_eq!(stats.min["salary"], Some(50000.0));
    assert_eq!(stats.max["salary"], Some(72000.0));
    assert_eq!(stats.sum["salary"], 305000.0);

    // A single numeric column has nothing to correlate with
    assert!(outcome.analysis.correlation.is_none());
}

#[test]
fn test_clean_roster_is_low_severity() {
    let outcome = in_memory_pipeline()
        .run_csv(fixture("clean_roster.csv"))
        .unwrap();

    assert_eq!(outcome.cleaning.final_rows, 4);
    assert_eq!(outcome.verdict.drop_rate, 0.0);
    assert_eq!(outcome.verdict.severity, Severity::Low);
    assert_eq!(outcome.context.subject_line(), "Data Quality Report: Clean Run");
}

#[test]
fn test_missing_required_column_is_fatal() {
    let err = in_memory_pipeline()
        .run_csv(fixture("missing_phone.csv"))
        .unwrap_err();

    assert_eq!(err.error_code(), "LOAD_MISSING_COLUMNS");
    assert_eq!(err.missing_columns(), Some(&["phone".to_string()][..]));
}

#[test]
fn test_header_only_file() {
    let outcome = in_memory_pipeline().run_csv(fixture("empty.csv")).unwrap();

    assert_eq!(outcome.cleaning.original_rows, 0);
    assert_eq!(outcome.cleaning.final_rows, 0);
    assert!(outcome.analysis.is_empty());
    assert_eq!(outcome.verdict.drop_rate, 0.0);
    assert_eq!(outcome.verdict.severity, Severity::Low);
}

#[test]
fn test_keep_duplicates() {
    let config = QualityConfig::builder()
        .remove_duplicates(false)
        .save_to_disk(false)
        .build()
        .unwrap();
    let outcome = QualityPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run_csv(fixture("employees.csv"))
        .unwrap();

    assert_eq!(outcome.cleaning.duplicates_dropped, 0);
    assert_eq!(outcome.cleaning.final_rows, 6);
}

#[test]
fn test_custom_thresholds_raise_alerts() {
    let config = QualityConfig::builder()
        .drop_rate_threshold(0.2)
        .invalid_email_threshold(0)
        .save_to_disk(false)
        .build()
        .unwrap();
    let outcome = QualityPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run_csv(fixture("employees.csv"))
        .unwrap();

    assert!(outcome.verdict.drop_rate_exceeded);
    assert!(outcome.verdict.invalid_emails_exceeded);
    assert!(outcome.verdict.has_alerts());
}

#[test]
fn test_unknown_numeric_column_is_fatal() {
    let config = QualityConfig::builder()
        .numeric_columns(["salary", "bonus"])
        .save_to_disk(false)
        .build()
        .unwrap();
    let err = QualityPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run_csv(fixture("clean_roster.csv"))
        .unwrap_err();

    assert_eq!(err.error_code(), "ANALYSIS_MISSING_COLUMNS");
}

// ============================================================================
// Stages Used Directly
// ============================================================================

#[test]
fn test_stages_compose_like_pipeline() {
    let df = load_csv(fixture("employees.csv")).unwrap();

    let (cleaned, report) = RowCleaner::new().clean(&df).unwrap();
    let analysis = DataAnalyzer::new().analyze(&cleaned).unwrap();
    let verdict = QualityGrader::default().grade(&report);

    let outcome = in_memory_pipeline()
        .run_csv(fixture("employees.csv"))
        .unwrap();
    assert_eq!(report, outcome.cleaning);
    assert_eq!(analysis, outcome.analysis);
    assert_eq!(verdict, outcome.verdict);
}

// ============================================================================
// Progress Reporting
// ============================================================================

#[test]
fn test_progress_from_loading_to_complete() {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = updates.clone();

    QualityPipeline::builder()
        .config(QualityConfig::builder().save_to_disk(false).build().unwrap())
        .on_progress(move |update| {
            updates_clone.lock().unwrap().push(update);
        })
        .build()
        .unwrap()
        .run_csv(fixture("employees.csv"))
        .unwrap();

    let updates = updates.lock().unwrap();
    assert_eq!(updates.first().unwrap().stage, PipelineStage::Loading);
    assert_eq!(updates.last().unwrap().stage, PipelineStage::Complete);
    assert_eq!(updates.last().unwrap().progress, 1.0);

    // Overall progress never goes backwards
    for pair in updates.windows(2) {
        assert!(pair[1].progress >= pair[0].progress);
    }
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn test_template_rendering() {
    let config = QualityConfig::builder()
        .client_name("Acme")
        .save_to_disk(false)
        .build()
        .unwrap();
    let outcome = QualityPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run_csv(fixture("employees.csv"))
        .unwrap();

    let body = outcome.context.render_template(
        "Hello $CLIENT_NAME, ${ROWS_CLEANED} of $ROWS_LOADED rows kept ($DROP_RATE, $SEVERITY). \
         Mean: $MEAN_VALUES. Cost: $$5. $UNKNOWN",
    );
    assert_eq!(
        body,
        "Hello Acme, 5 of 10 rows kept (50.00%, HIGH). Mean: salary: 61000.00. Cost: $5. $UNKNOWN"
    );
    assert_eq!(
        outcome.context.subject_line(),
        "[ACTION REQUIRED] Data Quality Alert: High Drop Rate"
    );
}

#[test]
fn test_artifacts_written() {
    let dir = scratch_dir("artifacts");
    let config = QualityConfig::builder()
        .output_dir(&dir)
        .client_name("Acme")
        .build()
        .unwrap();
    let outcome = QualityPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run_csv(fixture("employees.csv"))
        .unwrap();

    let processed = PathBuf::from(outcome.summary.processed_path.clone().unwrap());
    let report_path = PathBuf::from(outcome.summary.report_path.clone().unwrap());
    assert!(processed.starts_with(&dir));
    assert!(report_path.starts_with(&dir));

    // The cleaned CSV loads back with the same rows
    let reloaded = load_csv(&processed).unwrap();
    assert_eq!(reloaded.height(), 5);
    assert_eq!(reloaded.width(), outcome.cleaned.width());

    let report: QualityReport =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report.context.client_name, "Acme");
    assert_eq!(report.context.cleaning, outcome.cleaning);
    assert_eq!(report.subject, outcome.context.subject_line());
    assert_eq!(
        report.context.report_path.as_deref(),
        Some(report_path.as_path())
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_error_serializes_with_code() {
    let err = in_memory_pipeline()
        .run_csv(fixture("missing_phone.csv"))
        .unwrap_err();

    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(value["code"], "LOAD_MISSING_COLUMNS");
    assert_eq!(value["kind"], "schema");
    assert!(value["message"].as_str().unwrap().contains("phone"));
}
