//! Configuration types for the quality pipeline.
//!
//! Options are set through [`QualityConfig::builder()`] or overlaid from the
//! process environment with [`QualityConfig::from_env()`].

use crate::cleaner::REQUIRED_COLUMNS;
use crate::types::AlertThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variables read by [`QualityConfig::from_env`].
pub mod env_vars {
    pub const ALERT_DROP_RATE: &str = "ALERT_DROP_RATE";
    pub const ALERT_INVALID_EMAILS: &str = "ALERT_INVALID_EMAILS";
    pub const CLIENT_NAME: &str = "CLIENT_NAME";
    pub const EMAIL_FREQUENCY: &str = "EMAIL_FREQUENCY";
    pub const REQUIRED_COLUMNS: &str = "REQUIRED_COLUMNS";
    pub const REPORTS_DIR: &str = "REPORTS_DIR";
}

/// How often the quality email goes out. Only rendered into the report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl EmailFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for EmailFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailFrequency {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ConfigValidationError::InvalidFrequency(s.to_string())),
        }
    }
}

/// Configuration for a quality run.
///
/// # Example
///
/// ```rust,ignore
/// use roster_quality::QualityConfig;
///
/// let config = QualityConfig::builder()
///     .drop_rate_threshold(0.25)
///     .client_name("Acme")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Whether exact duplicate rows are removed before validation.
    /// Default: true
    pub remove_duplicates: bool,

    /// Columns that must be present after header normalization.
    /// Default: id, name, email, phone, salary, date_joined
    pub required_columns: Vec<String>,

    /// Restricts the analyzer to these columns, in this order.
    /// Default: None (every numeric column)
    pub numeric_columns: Option<Vec<String>>,

    /// Drop rate (0.0 - 1.0) above which an alert is raised.
    /// Default: 0.5
    pub drop_rate_threshold: f64,

    /// Invalid email count above which an alert is raised.
    /// Default: 1000
    pub invalid_email_threshold: usize,

    /// Client name rendered into the report.
    /// Default: "Customer"
    pub client_name: String,

    /// Default: Weekly
    pub email_frequency: EmailFrequency,

    /// Directory for the cleaned CSV and the JSON quality report.
    /// Default: "data/processed"
    pub output_dir: PathBuf,

    /// When false, results stay in memory and no files are written.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            required_columns: default_required_columns(),
            numeric_columns: None,
            drop_rate_threshold: 0.5,
            invalid_email_threshold: 1000,
            client_name: "Customer".to_string(),
            email_frequency: EmailFrequency::default(),
            output_dir: PathBuf::from("data/processed"),
            save_to_disk: true,
        }
    }
}

fn default_required_columns() -> Vec<String> {
    REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn parse_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

impl QualityConfig {
    pub fn builder() -> QualityConfigBuilder {
        QualityConfigBuilder::default()
    }

    /// Defaults overlaid with the process environment.
    ///
    /// Unset variables keep their default. Set but unparseable values are an
    /// error rather than being ignored.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed by [`env_vars`] names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(env_vars::ALERT_DROP_RATE) {
            config.drop_rate_threshold =
                raw.trim().parse().map_err(|_| ConfigValidationError::InvalidEnvValue {
                    var: env_vars::ALERT_DROP_RATE.to_string(),
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup(env_vars::ALERT_INVALID_EMAILS) {
            config.invalid_email_threshold =
                raw.trim().parse().map_err(|_| ConfigValidationError::InvalidEnvValue {
                    var: env_vars::ALERT_INVALID_EMAILS.to_string(),
                    value: raw.clone(),
                })?;
        }
        if let Some(name) = lookup(env_vars::CLIENT_NAME) {
            config.client_name = name;
        }
        if let Some(raw) = lookup(env_vars::EMAIL_FREQUENCY) {
            config.email_frequency = raw.parse()?;
        }
        if let Some(raw) = lookup(env_vars::REQUIRED_COLUMNS) {
            config.required_columns = parse_column_list(&raw);
        }
        if let Some(dir) = lookup(env_vars::REPORTS_DIR) {
            config.output_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.drop_rate_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "drop_rate_threshold".to_string(),
                value: self.drop_rate_threshold,
            });
        }

        if self.required_columns.is_empty() {
            return Err(ConfigValidationError::NoRequiredColumns);
        }

        if let Some(columns) = &self.numeric_columns
            && let Some(blank) = columns.iter().find(|c| c.trim().is_empty())
        {
            return Err(ConfigValidationError::InvalidColumnName(blank.clone()));
        }

        if self.client_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyClientName);
        }

        Ok(())
    }

    /// Grading thresholds derived from this configuration.
    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            drop_rate: self.drop_rate_threshold,
            invalid_emails: self.invalid_email_threshold,
        }
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("At least one required column must be configured")]
    NoRequiredColumns,

    #[error("Invalid column name: '{0}'")]
    InvalidColumnName(String),

    #[error("Client name must not be empty")]
    EmptyClientName,

    #[error("Invalid email frequency: '{0}' (expected daily, weekly or monthly)")]
    InvalidFrequency(String),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnvValue { var: String, value: String },
}

/// Builder for [`QualityConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct QualityConfigBuilder {
    remove_duplicates: Option<bool>,
    required_columns: Option<Vec<String>>,
    numeric_columns: Option<Vec<String>>,
    drop_rate_threshold: Option<f64>,
    invalid_email_threshold: Option<usize>,
    client_name: Option<String>,
    email_frequency: Option<EmailFrequency>,
    output_dir: Option<PathBuf>,
    save_to_disk: Option<bool>,
}

impl QualityConfigBuilder {
    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Override the set of columns that must be present.
    pub fn required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict analysis to these numeric columns.
    ///
    /// An empty list is the same as not setting one.
    pub fn numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.numeric_columns = (!columns.is_empty()).then_some(columns);
        self
    }

    /// Set the drop rate alert threshold.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.5 = 50%)
    pub fn drop_rate_threshold(mut self, threshold: f64) -> Self {
        self.drop_rate_threshold = Some(threshold);
        self
    }

    pub fn invalid_email_threshold(mut self, threshold: usize) -> Self {
        self.invalid_email_threshold = Some(threshold);
        self
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn email_frequency(mut self, frequency: EmailFrequency) -> Self {
        self.email_frequency = Some(frequency);
        self
    }

    /// Set the output directory for the cleaned table and the report.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable writing artifacts to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `QualityConfig` or an error if validation fails.
    pub fn build(self) -> Result<QualityConfig, ConfigValidationError> {
        let defaults = QualityConfig::default();
        let config = QualityConfig {
            remove_duplicates: self.remove_duplicates.unwrap_or(defaults.remove_duplicates),
            required_columns: self.required_columns.unwrap_or(defaults.required_columns),
            numeric_columns: self.numeric_columns,
            drop_rate_threshold: self
                .drop_rate_threshold
                .unwrap_or(defaults.drop_rate_threshold),
            invalid_email_threshold: self
                .invalid_email_threshold
                .unwrap_or(defaults.invalid_email_threshold),
            client_name: self.client_name.unwrap_or(defaults.client_name),
            email_frequency: self.email_frequency.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
        };

        config.validate()?;
        Ok(config)
    }
}
