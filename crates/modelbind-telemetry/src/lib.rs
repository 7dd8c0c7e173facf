//! Observability for modelbind.
//!
//! Binding diagnostics flow through `tracing`; counters and histograms flow
//! through `metrics`. This crate installs the global subscriber and the
//! Prometheus recorder that receive them.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: Prometheus text format via `metrics-exporter-prometheus`
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `modelbind_body_bindings_total` | Counter | `outcome`, `formatter` | Body binding attempts |
//! | `modelbind_formatter_read_duration_seconds` | Histogram | `formatter` | Formatter read latency |
//! | `modelbind_form_limits_total` | Counter | `outcome` | Form limits policy executions |
//!
//! # Example
//!
//! ```rust,ignore
//! use modelbind_telemetry::{TelemetryConfig, init_telemetry, render_metrics};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("orders-api")
//!     .environment("production")
//!     .build();
//!
//! init_telemetry(&config)?;
//!
//! // Serve this from the host's /metrics route.
//! let body = render_metrics().unwrap_or_default();
//! ```

#![doc(html_root_url = "https://docs.rs/modelbind-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{
    init_metrics, record_body_binding, record_form_limits, record_formatter_read,
    render_metrics, BindingOutcome, MetricsConfig, MetricsRegistry,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and metrics.
///
/// Logging is initialized first so metrics failures are visible.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    tracing::debug!(
        service = %config.service_name,
        environment = %config.environment,
        "Telemetry initialized"
    );
    Ok(())
}
