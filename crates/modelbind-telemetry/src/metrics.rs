//! Prometheus metrics for modelbind.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `modelbind_body_bindings_total` | Counter | `outcome`, `formatter` | Body binding attempts |
//! | `modelbind_formatter_read_duration_seconds` | Histogram | `formatter` | Formatter read latency |
//! | `modelbind_form_limits_total` | Counter | `outcome` | Form limits policy executions |
//!
//! Recording functions are no-ops until a recorder is installed, so library
//! code can call them unconditionally.
//!
//! # Example
//!
//! ```rust,ignore
//! use modelbind_telemetry::metrics::{record_body_binding, BindingOutcome};
//!
//! record_body_binding(BindingOutcome::Bound, "JsonInputFormatter");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Label value used when no formatter was involved.
pub const NO_FORMATTER_LABEL: &str = "none";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Service name added as a global `service` label.
    pub service_name: String,

    /// Histogram buckets for formatter read duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "modelbind".to_string(),
            // 100us up to 1s; body reads are usually sub-millisecond.
            duration_buckets: vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0],
        }
    }
}

/// Metrics registry for modelbind.
///
/// Wraps the Prometheus handle so hosts can serve it from their own
/// `/metrics` endpoint.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with the given handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Returns the registry backed by the global recorder, if installed.
    #[must_use]
    pub fn global() -> Option<Self> {
        METRICS_HANDLE.get().cloned().map(Self::new)
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initializes the metrics subsystem.
///
/// Installs a global Prometheus recorder without an HTTP listener; use
/// [`render_metrics`] to expose the output.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for unusable buckets and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.duration_buckets.is_empty() {
        return Err(TelemetryError::InvalidConfig(
            "metrics duration buckets must not be empty".to_string(),
        ));
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .set_buckets(&config.duration_buckets)
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        "modelbind_body_bindings_total",
        "Total body binding attempts by outcome and formatter"
    );

    describe_histogram!(
        "modelbind_formatter_read_duration_seconds",
        "Input formatter read duration in seconds"
    );

    describe_counter!(
        "modelbind_form_limits_total",
        "Total form limits policy executions by outcome"
    );
}

/// How a body binding attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingOutcome {
    /// A formatter produced a model.
    Bound,
    /// No formatter accepted the request.
    NoFormatter,
    /// The formatter returned no value.
    NoValue,
    /// The body violated the expected format.
    FormatError,
    /// A non-format failure was recorded as a model error.
    ConvertedException,
    /// A non-format failure was propagated to the caller.
    UnhandledException,
}

impl BindingOutcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bound => "bound",
            Self::NoFormatter => "no_formatter",
            Self::NoValue => "no_value",
            Self::FormatError => "format_error",
            Self::ConvertedException => "converted_exception",
            Self::UnhandledException => "unhandled_exception",
        }
    }
}

impl fmt::Display for BindingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the end of a body binding attempt.
pub fn record_body_binding(outcome: BindingOutcome, formatter: &str) {
    counter!(
        "modelbind_body_bindings_total",
        "outcome" => outcome.as_str(),
        "formatter" => formatter.to_string()
    )
    .increment(1);
}

/// Records how long a formatter spent reading the body.
pub fn record_formatter_read(formatter: &str, duration: Duration) {
    histogram!(
        "modelbind_formatter_read_duration_seconds",
        "formatter" => formatter.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a form limits policy execution.
///
/// `outcome` is one of `applied`, `already_read` or `superseded`.
pub fn record_form_limits(outcome: &'static str) {
    counter!("modelbind_form_limits_total", "outcome" => outcome).increment(1);
}
