//! # Modelbind Formatters
//!
//! Input formatters turn a request body into a model. This crate defines the
//! formatter contract, the ordered registry formatters are selected from,
//! and a reusable base for text formats.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`InputFormatter`] | Capability check plus asynchronous read |
//! | [`InputFormatterContext`] | Per-read view of the request and target model |
//! | [`InputFormatterResult`] | `Success(value)` or `NoValue` |
//! | [`InputFormatError`] | The body violated the expected format |
//! | [`FormatterCollection`] | Ordered registry with first-match selection |
//! | [`MediaTypeCollection`] | Supported media types with wildcard matching |
//! | [`TextInputFormatter`] | Charset-aware base for text formats |
//!
//! ## Example
//!
//! ```rust
//! use modelbind_core::{HttpContext, ModelMetadata, RecordingDiagnostics};
//! use modelbind_formatters::{
//!     FormatterCollection, InputFormatterContext, InputFormatterResult, TextInputFormatter,
//! };
//!
//! let formatters = FormatterCollection::new().with(
//!     TextInputFormatter::from_fn(|_ctx, text| Ok(InputFormatterResult::success(text)))
//!         .with_name("PlainText")
//!         .with_media_type("text/plain")
//!         .unwrap(),
//! );
//!
//! let http = HttpContext::builder().content_type("text/plain").body("hi").build();
//! let metadata = ModelMetadata::for_type::<String>();
//! let ctx = InputFormatterContext::new(&http, "message", &metadata, false);
//! let sink = RecordingDiagnostics::new();
//!
//! let formatter = formatters.select(&ctx, &sink).unwrap();
//! assert_eq!(formatter.name(), "PlainText");
//! ```

#![doc(html_root_url = "https://docs.rs/modelbind-formatters/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod collection;
mod context;
mod error;
mod formatter;
mod media_type;
mod text;

pub use collection::FormatterCollection;
pub use context::InputFormatterContext;
pub use error::{InputFormatError, ReadError};
pub use formatter::{InputFormatter, InputFormatterResult};
pub use media_type::MediaTypeCollection;
pub use text::{FnTextReader, TextBodyReader, TextEncoding, TextInputFormatter};

/// Re-export of [`mime`] for declaring supported media types.
pub use mime;
