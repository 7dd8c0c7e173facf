//! # Modelbind Binder
//!
//! Binds a model from the request body.
//!
//! [`BodyModelBinder`] selects an input formatter, runs it and maps the
//! outcome onto the binding context:
//!
//! | Formatter outcome | Binding result | Model state |
//! |-------------------|----------------|-------------|
//! | no formatter accepts | not set | "Unsupported content type '...'." |
//! | `Success(value)` | set to `value` | unchanged |
//! | `NoValue` | not set | missing-body message |
//! | format error | not set | the error, attached |
//! | other error, converted | not set | the error, attached |
//! | other error | not set | unchanged; returned as [`BindingError::Unhandled`](modelbind_core::BindingError) |
//!
//! Other errors are converted when either
//! [`BodyBindingOptions::send_bad_request_for_all_formatter_exceptions`] is
//! set or the formatter opts in through
//! `send_bad_request_for_exceptions_during_deserialization`.

#![doc(html_root_url = "https://docs.rs/modelbind-binder/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod options;
mod provider;

pub use binder::BodyModelBinder;
pub use options::BodyBindingOptions;
pub use provider::{BodyModelBinderProvider, ProviderError};
