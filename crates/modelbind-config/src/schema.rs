//! Configuration schema types for the telemetry sections.
//!
//! The body binding and form limit sections reuse
//! [`BodyBindingOptions`](modelbind_binder::BodyBindingOptions) and
//! [`FormOptions`](modelbind_limits::FormOptions) directly.

use modelbind_telemetry::metrics::MetricsConfig;
use modelbind_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Log levels accepted without a target prefix.
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. `info`, `modelbind_binder=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit span enter and close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts the section into the runtime logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            span_events: self.span_events,
            file_line_info: self.include_location,
            ..LogConfig::default()
        }
    }

    /// Returns `true` if every directive in `level` ends in a known level.
    ///
    /// ```
    /// use modelbind_config::LoggingConfig;
    ///
    /// let mut logging = LoggingConfig::default();
    /// logging.level = "warn,modelbind_binder=debug".to_string();
    /// assert!(logging.has_valid_level());
    ///
    /// logging.level = "verbose".to_string();
    /// assert!(!logging.has_valid_level());
    /// ```
    #[must_use]
    pub fn has_valid_level(&self) -> bool {
        let mut directives = self
            .level
            .split(',')
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .peekable();

        directives.peek().is_some()
            && directives.all(|directive| {
                let level = directive.rsplit_once('=').map_or(directive, |(_, level)| level);
                LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
            })
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable metrics collection.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Value of the global `service` label.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Histogram bucket boundaries for formatter read duration, in seconds.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: default_service_name(),
            duration_buckets: default_duration_buckets(),
        }
    }
}

impl MetricsSection {
    /// Converts the section into the runtime metrics configuration.
    #[must_use]
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            service_name: self.service_name.clone(),
            duration_buckets: self.duration_buckets.clone(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    MetricsConfig::default().service_name
}

fn default_duration_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}
