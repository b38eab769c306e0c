//! Aggregate analysis and quality grading of cleaned tables.
//!
//! This module provides:
//! - [`DataAnalyzer`]: shape, missing values, descriptive statistics and
//!   correlation over the numeric columns
//! - [`QualityGrader`]: drop rate, severity tier and alert threshold breaches

mod analyzer;
mod grader;
mod statistics;

pub use analyzer::DataAnalyzer;
pub use grader::{HIGH_SEVERITY_ABOVE, MEDIUM_SEVERITY_FROM, QualityGrader, classify, drop_rate};
