//! Root configuration type.

use crate::{ConfigError, LoggingConfig, MetricsSection};
use modelbind_binder::BodyBindingOptions;
use modelbind_limits::FormOptions;
use modelbind_telemetry::{LogFormat, TelemetryConfig};
use serde::{Deserialize, Serialize};

/// Complete modelbind configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use modelbind_config::ModelBindConfig;
///
/// let config = ModelBindConfig::default();
/// assert!(!config.binding.allow_empty_input_in_body_binding);
/// assert_eq!(config.form_limits.value_count_limit, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ModelBindConfig {
    /// Body binding behavior.
    #[serde(default)]
    pub binding: BodyBindingOptions,

    /// Default form limits.
    #[serde(default)]
    pub form_limits: FormOptions,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl ModelBindConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use modelbind_binder::BodyBindingOptions;
    /// use modelbind_config::ModelBindConfig;
    ///
    /// let config = ModelBindConfig::builder()
    ///     .binding(BodyBindingOptions::new().with_allow_empty_input(true))
    ///     .build();
    ///
    /// assert!(config.binding.allow_empty_input_in_body_binding);
    /// ```
    #[must_use]
    pub fn builder() -> ModelBindConfigBuilder {
        ModelBindConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The log level is not a known level or `target=level` directive
    /// - `form_limits.value_count_limit` is zero
    /// - `form_limits.multipart_boundary_length_limit` is zero
    /// - Buffering is on and `memory_buffer_threshold` exceeds `buffer_body_length_limit`
    /// - Metrics are enabled with no histogram buckets
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.logging.has_valid_level() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown log level: {}", self.logging.level),
            ));
        }

        let limits = &self.form_limits;
        if limits.value_count_limit == 0 {
            return Err(ConfigError::invalid_value(
                "form_limits.value_count_limit",
                "must be greater than zero",
            ));
        }

        if limits.multipart_boundary_length_limit == 0 {
            return Err(ConfigError::invalid_value(
                "form_limits.multipart_boundary_length_limit",
                "must be greater than zero",
            ));
        }

        let threshold = u64::try_from(limits.memory_buffer_threshold).unwrap_or(u64::MAX);
        if limits.buffer_body && threshold > limits.buffer_body_length_limit {
            return Err(ConfigError::invalid_value(
                "form_limits.memory_buffer_threshold",
                format!(
                    "must not exceed buffer_body_length_limit ({})",
                    limits.buffer_body_length_limit
                ),
            ));
        }

        if self.metrics.enabled && self.metrics.duration_buckets.is_empty() {
            return Err(ConfigError::invalid_value(
                "metrics.duration_buckets",
                "at least one bucket is required",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug-level pretty logs with span events and source locations, so
    /// formatter selection diagnostics are visible.
    ///
    /// # Example
    ///
    /// ```
    /// use modelbind_config::ModelBindConfig;
    ///
    /// let config = ModelBindConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.span_events = true;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at `info`. Client formatter failures are reported as model
    /// errors instead of propagating.
    ///
    /// # Example
    ///
    /// ```
    /// use modelbind_config::ModelBindConfig;
    /// use modelbind_telemetry::LogFormat;
    ///
    /// let config = ModelBindConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// assert!(config.binding.send_bad_request_for_all_formatter_exceptions);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config.binding.send_bad_request_for_all_formatter_exceptions = true;

        config
    }

    /// Builds the runtime telemetry configuration from the logging and
    /// metrics sections.
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(&self.metrics.service_name)
            .metrics(self.metrics.to_metrics_config())
            .logging(self.logging.to_log_config())
            .build()
    }
}

/// Builder for [`ModelBindConfig`].
#[derive(Debug, Default)]
#[must_use]
pub struct ModelBindConfigBuilder {
    config: ModelBindConfig,
}

impl ModelBindConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body binding options.
    pub const fn binding(mut self, binding: BodyBindingOptions) -> Self {
        self.config.binding = binding;
        self
    }

    /// Set the default form limits.
    pub fn form_limits(mut self, form_limits: FormOptions) -> Self {
        self.config.form_limits = form_limits;
        self
    }

    /// Set the logging section.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set the metrics section.
    pub fn metrics(mut self, metrics: MetricsSection) -> Self {
        self.config.metrics = metrics;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ModelBindConfig {
        self.config
    }
}
