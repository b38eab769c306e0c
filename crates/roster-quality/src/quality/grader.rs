use crate::config::QualityConfig;
use crate::types::{AlertThresholds, CleaningReport, QualityVerdict, Severity};
use tracing::{debug, warn};

/// Drop rates below this are `LOW`.
pub const MEDIUM_SEVERITY_FROM: f64 = 0.10;
/// Drop rates above this are `HIGH`.
pub const HIGH_SEVERITY_ABOVE: f64 = 0.30;

/// Grades a cleaning run against alert thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityGrader {
    thresholds: AlertThresholds,
}

impl QualityGrader {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_config(config: &QualityConfig) -> Self {
        Self::new(config.thresholds())
    }

    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    /// Compute the drop rate, severity tier and threshold breaches.
    pub fn grade(&self, report: &CleaningReport) -> QualityVerdict {
        let drop_rate = drop_rate(report);
        let severity = classify(drop_rate);

        let drop_rate_exceeded = drop_rate > self.thresholds.drop_rate;
        if drop_rate_exceeded {
            warn!(
                drop_rate,
                threshold = self.thresholds.drop_rate,
                "Drop rate above alert threshold"
            );
        }

        let invalid_emails_exceeded =
            report.invalid_emails_dropped > self.thresholds.invalid_emails;
        if invalid_emails_exceeded {
            warn!(
                invalid_emails = report.invalid_emails_dropped,
                threshold = self.thresholds.invalid_emails,
                "Invalid emails above alert threshold"
            );
        }

        debug!(drop_rate, severity = %severity, "Graded cleaning run");
        QualityVerdict {
            drop_rate,
            severity,
            drop_rate_exceeded,
            invalid_emails_exceeded,
            thresholds: self.thresholds,
        }
    }
}

/// Fraction of original rows missing from the cleaned table, in [0, 1].
/// Zero when nothing was loaded.
pub fn drop_rate(report: &CleaningReport) -> f64 {
    if report.original_rows == 0 {
        return 0.0;
    }
    // Computed from the removed count so that e.g. 10 of 100 is exactly 0.10
    (report.rows_removed() as f64 / report.original_rows as f64).clamp(0.0, 1.0)
}

/// Severity tier for a drop rate. Both bounds of the middle tier are `MEDIUM`.
pub fn classify(drop_rate: f64) -> Severity {
    if drop_rate < MEDIUM_SEVERITY_FROM {
        Severity::Low
    } else if drop_rate <= HIGH_SEVERITY_ABOVE {
        Severity::Medium
    } else {
        Severity::High
    }
}
