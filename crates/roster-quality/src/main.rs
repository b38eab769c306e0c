//! CLI entry point for the employee-record quality pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use roster_quality::{PipelineError, PipelineOutcome, PipelineResult, QualityConfig, QualityPipeline};
use serde_json::json;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Employee-record validation, cleaning and data-quality grading",
    long_about = "Validates and cleans an employee roster CSV, computes aggregate statistics \
                  and grades the run by how many rows were dropped.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  ALERT_DROP_RATE        Drop rate alert threshold (0.0 - 1.0)\n  \
                  ALERT_INVALID_EMAILS   Invalid email count alert threshold\n  \
                  CLIENT_NAME            Client name rendered into the report\n  \
                  EMAIL_FREQUENCY        daily, weekly or monthly\n  \
                  REQUIRED_COLUMNS       Comma-separated required columns\n  \
                  REPORTS_DIR            Output directory for artifacts\n\n\
                  EXAMPLES:\n  \
                  # Clean a roster and write artifacts to data/processed\n  \
                  roster-quality -i employees.csv\n\n  \
                  # Only analyze salary, keep duplicate rows\n  \
                  roster-quality -i employees.csv --numeric-columns salary --keep-duplicates\n\n  \
                  # Render an email body and print a machine-readable summary\n  \
                  roster-quality -i employees.csv --template email.txt --json"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for the cleaned CSV and the JSON report
    ///
    /// Overrides REPORTS_DIR
    #[arg(short, long)]
    output: Option<String>,

    /// Comma-separated numeric columns to analyze (default: all numeric columns)
    #[arg(long, value_delimiter = ',')]
    numeric_columns: Vec<String>,

    /// Keep exact duplicate rows instead of removing them
    #[arg(long)]
    keep_duplicates: bool,

    /// Drop rate (0.0 - 1.0) above which an alert is raised
    #[arg(long)]
    drop_rate_threshold: Option<f64>,

    /// Invalid email count above which an alert is raised
    #[arg(long)]
    invalid_email_threshold: Option<usize>,

    /// Client name rendered into the report
    #[arg(long)]
    client_name: Option<String>,

    /// Template file rendered with the report placeholders ($NAME or ${NAME})
    #[arg(short, long)]
    template: Option<String>,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON.
    #[arg(long)]
    json: bool,

    /// Do not write the cleaned CSV or the JSON report
    #[arg(long)]
    no_save: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled so stdout
/// only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if dotenv().is_ok() {
        info!("Loaded environment from .env");
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => return Err(fail(&args, e, "Invalid configuration")),
    };
    let template = match &args.template {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template: {path}"))?,
        ),
        None => None,
    };

    let quiet = args.quiet || args.json;
    let pipeline = QualityPipeline::builder()
        .config(config)
        .on_progress(move |update| {
            if !quiet {
                info!(
                    "[{:>3.0}%] {}: {}",
                    update.progress * 100.0,
                    update.stage.display_name(),
                    update.message
                );
            }
        })
        .build()?;

    let outcome = match pipeline.run_csv(&args.input) {
        Ok(outcome) => outcome,
        Err(e) => return Err(fail(&args, e, &format!("Quality run failed for {}", args.input))),
    };

    let rendered = template.map(|t| outcome.context.render_template(&t));

    if args.json {
        let output = json!({
            "summary": outcome.summary,
            "subject": outcome.context.subject_line(),
            "verdict": outcome.verdict,
            "cleaning": outcome.cleaning,
            "analysis": outcome.analysis,
            "email_body": rendered,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_human_readable_summary(&args.input, &outcome);
        if let Some(body) = rendered {
            println!("Subject: {}", outcome.context.subject_line());
            println!();
            println!("{body}");
        }
    }

    Ok(())
}

/// Print a fatal error as JSON when requested and wrap it for the exit path.
fn fail(args: &Args, e: PipelineError, context: &str) -> anyhow::Error {
    if args.json {
        match serde_json::to_string_pretty(&json!({ "error": e })) {
            Ok(body) => println!("{body}"),
            Err(err) => warn!("Failed to serialize error: {}", err),
        }
    }
    if e.is_recoverable() {
        warn!("Fix the configuration (flags, environment or .env) and retry");
    }
    anyhow!(e).context(context.to_string())
}

/// Environment configuration overlaid with command line flags.
fn build_config(args: &Args) -> PipelineResult<QualityConfig> {
    let mut config = QualityConfig::from_env()?;

    if let Some(output) = &args.output {
        config.output_dir = output.into();
    }
    let numeric: Vec<String> = args
        .numeric_columns
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if !numeric.is_empty() {
        config.numeric_columns = Some(numeric);
    }
    if args.keep_duplicates {
        config.remove_duplicates = false;
    }
    if let Some(threshold) = args.drop_rate_threshold {
        config.drop_rate_threshold = threshold;
    }
    if let Some(threshold) = args.invalid_email_threshold {
        config.invalid_email_threshold = threshold;
    }
    if let Some(name) = &args.client_name {
        config.client_name = name.clone();
    }
    if args.no_save {
        config.save_to_disk = false;
    }

    config.validate()?;
    Ok(config)
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the primary output of the command and
/// must stay visible regardless of log level.
fn print_human_readable_summary(input: &str, outcome: &PipelineOutcome) {
    let summary = &outcome.summary;
    let cleaning = &outcome.cleaning;

    println!();
    println!("{}", "=".repeat(80));
    println!("QUALITY RUN COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!("Input: {}", input);
    println!(
        "Rows: {} loaded -> {} cleaned (drop rate {}, severity {})",
        summary.rows_loaded, summary.rows_cleaned, summary.drop_rate, summary.severity
    );
    println!();

    println!("Cleaning:");
    println!("  Duplicates dropped: {}", cleaning.duplicates_dropped);
    println!("  Invalid emails dropped: {}", cleaning.invalid_emails_dropped);
    println!("  Invalid phones dropped: {}", cleaning.invalid_phones_dropped);
    println!("  Invalid salaries dropped: {}", cleaning.invalid_numbers_dropped);
    println!("  Invalid dates dropped: {}", cleaning.invalid_dates_dropped);
    println!("  Rows failing validation: {}", cleaning.invalid_rows_dropped);
    if !cleaning.extra_columns.is_empty() {
        println!("  Extra columns: {}", cleaning.extra_columns.join(", "));
    }
    println!();

    if let Some(stats) = &outcome.analysis.statistics {
        println!("Numeric columns:");
        println!("  {:<20} {:>14} {:>14} {:>14}", "Column", "Mean", "Min", "Max");
        for column in stats.mean.keys() {
            println!(
                "  {:<20} {:>14} {:>14} {:>14}",
                column,
                format_stat(stats.mean.get(column)),
                format_stat(stats.min.get(column)),
                format_stat(stats.max.get(column)),
            );
        }
        println!();
    }

    if outcome.verdict.drop_rate_exceeded {
        println!("  ! Drop rate above alert threshold");
    }
    if outcome.verdict.invalid_emails_exceeded {
        println!("  ! Invalid emails above alert threshold");
    }

    println!("Subject: {}", outcome.context.subject_line());
    if let Some(path) = &summary.processed_path {
        println!("Cleaned data: {}", path);
    }
    if let Some(path) = &summary.report_path {
        println!("Report: {}", path);
    }
    println!("{}", "=".repeat(80));
}

fn format_stat(value: Option<&Option<f64>>) -> String {
    match value.copied().flatten() {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}
