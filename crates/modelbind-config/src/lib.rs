//! Layered configuration for modelbind.
//!
//! This crate loads the options that shape body binding and form reading:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → files → env)
//!
//! # Overview
//!
//! [`ModelBindConfig`] holds four sections:
//!
//! - `binding` - [`BodyBindingOptions`](modelbind_binder::BodyBindingOptions)
//! - `form_limits` - default [`FormOptions`](modelbind_limits::FormOptions)
//! - `logging` - [`LoggingConfig`]
//! - `metrics` - [`MetricsSection`]
//!
//! # Example
//!
//! ```no_run
//! use modelbind_config::ConfigLoader;
//!
//! # fn main() -> Result<(), modelbind_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("modelbind.toml")?
//!     .with_env()
//!     .load()?;
//!
//! println!("value count limit: {}", config.form_limits.value_count_limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [binding]
//! allow_empty_input_in_body_binding = false
//! send_bad_request_for_all_formatter_exceptions = true
//!
//! [form_limits]
//! buffer_body = false
//! value_count_limit = 1024
//! key_length_limit = 2048
//! multipart_body_length_limit = 134217728
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! service_name = "orders"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every value can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `MODELBIND__BINDING__ALLOW_EMPTY_INPUT_IN_BODY_BINDING=true`
//! - `MODELBIND__FORM_LIMITS__VALUE_LENGTH_LIMIT=65536`
//! - `MODELBIND__METRICS__ENABLED=false`

#![doc(html_root_url = "https://docs.rs/modelbind-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{ModelBindConfig, ModelBindConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{LoggingConfig, MetricsSection, LOG_LEVELS};
