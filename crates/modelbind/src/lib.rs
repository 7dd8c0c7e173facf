//! # Modelbind
//!
//! **Request body model binding with pluggable input formatters**
//!
//! Modelbind reads a typed model from an HTTP request body:
//!
//! - **Formatter selection** – the first registered formatter that accepts the
//!   request's content type reads the body
//! - **Model state** – client errors (unsupported media type, empty body,
//!   malformed input) become model errors instead of failures
//! - **Exception policy** – a global flag or a per-formatter override decides
//!   whether other formatter failures become model errors or propagate
//! - **Form limits** – the most specific limits filter governs how the form
//!   is read
//!
//! ## Quick Start
//!
//! ```rust
//! use modelbind::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let binding = ModelBinding::builder()
//!     .formatter(
//!         TextInputFormatter::from_fn(|_ctx, text| Ok(InputFormatterResult::success(text.len())))
//!             .with_media_type("text/plain")
//!             .unwrap(),
//!     )
//!     .build();
//!
//! let http = HttpContext::builder().content_type("text/plain").body("four").build();
//! let bound = binding.bind_body::<usize>(&http, "length").await.unwrap();
//! assert_eq!(bound.model(), Some(&4));
//!
//! let http = HttpContext::builder().content_type("application/xml").body("<x/>").build();
//! let bound = binding.bind_body::<usize>(&http, "length").await.unwrap();
//! assert!(!bound.is_valid());
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! HttpContext → FormatterCollection::select → InputFormatter::read → ModelBindingContext
//!                     ↓ none                        ↓ error
//!            UnsupportedContentType       model error or BindingError::Unhandled
//! ```

#![doc(html_root_url = "https://docs.rs/modelbind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;

pub use binding::{BodyBinding, ModelBinding, ModelBindingBuilder};

// Re-export core types
pub use modelbind_core as core;

// Re-export input formatters
pub use modelbind_formatters as formatters;

// Re-export the body binder
pub use modelbind_binder as binder;

// Re-export form limits
pub use modelbind_limits as limits;

// Re-export telemetry
pub use modelbind_telemetry as telemetry;

// Re-export configuration
pub use modelbind_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use modelbind::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{BodyBinding, ModelBinding, ModelBindingBuilder};

    pub use modelbind_core::{
        BindingError, BindingSource, DiagnosticEvent, DiagnosticSink, HttpContext, ModelBinder,
        ModelBindingContext, ModelMetadata, ModelStateDictionary, RequestId,
    };

    pub use modelbind_formatters::{
        FormatterCollection, InputFormatter, InputFormatterContext, InputFormatterResult,
        ReadError, TextInputFormatter,
    };

    pub use modelbind_binder::{BodyBindingOptions, BodyModelBinder, BodyModelBinderProvider};

    pub use modelbind_limits::{
        read_form, FilterScope, FormCollection, FormFeature, FormLimitsOutcome,
        FormLimitsPolicies, FormOptions, RequestFormLimits,
    };

    pub use modelbind_config::{ConfigLoader, ModelBindConfig};

    pub use modelbind_telemetry::{init_telemetry, TelemetryConfig};
}
