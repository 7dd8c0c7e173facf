//! # Modelbind Core
//!
//! Core types shared by every modelbind crate.
//!
//! This crate provides the request and binding-state vocabulary the
//! formatter selector, body binder and form limits filter operate on:
//!
//! - [`HttpContext`] - Per-request data: method, URI, headers, body and features
//! - [`RequestBody`] - Read-once streaming request payload
//! - [`Features`] - Typed per-request extension map
//! - [`ModelMetadata`] - Description of the model being bound
//! - [`ModelBindingContext`] / [`ModelBindingResult`] - Binding input and output
//! - [`ModelStateDictionary`] - Field-keyed model-state errors
//! - [`DiagnosticEvent`] / [`DiagnosticSink`] - Structured decision events
//! - [`BindingError`] - Errors that escape a binding attempt

#![doc(html_root_url = "https://docs.rs/modelbind-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod body;
mod context;
pub mod diagnostics;
mod error;
mod features;
mod metadata;
mod model_state;

pub use binding::{Model, ModelBinder, ModelBindingContext, ModelBindingResult};
pub use body::{BodyStream, RequestBody};
pub use context::{HttpContext, HttpContextBuilder, RequestId};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, RecordingDiagnostics, TracingDiagnostics};
pub use error::{BindingError, BindingResult, BoxError, UnsupportedContentTypeError};
pub use features::Features;
pub use metadata::{BindingSource, ModelBindingMessageProvider, ModelMetadata};
pub use model_state::{ModelError, ModelStateDictionary, ModelStateEntry};
