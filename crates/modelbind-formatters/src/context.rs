//! Formatter invocation context.

use modelbind_core::{HttpContext, ModelMetadata, RequestBody};
use std::any::TypeId;

/// Everything a formatter needs for one read.
///
/// A context is created fresh for each binding attempt and discarded after
/// the formatter returns. Formatters must take all per-request data from
/// here and never from their own fields.
///
/// # Example
///
/// ```rust
/// use modelbind_core::{HttpContext, ModelMetadata};
/// use modelbind_formatters::InputFormatterContext;
///
/// struct Person;
///
/// let http = HttpContext::builder()
///     .content_type("application/json; charset=utf-8")
///     .build();
/// let metadata = ModelMetadata::for_type::<Person>();
/// let ctx = InputFormatterContext::new(&http, "person", &metadata, false);
///
/// assert_eq!(ctx.media_type().unwrap().essence_str(), "application/json");
/// assert_eq!(ctx.charset().as_deref(), Some("utf-8"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InputFormatterContext<'a> {
    http_context: &'a HttpContext,
    model_name: &'a str,
    metadata: &'a ModelMetadata,
    treat_empty_input_as_default_value: bool,
}

impl<'a> InputFormatterContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(
        http_context: &'a HttpContext,
        model_name: &'a str,
        metadata: &'a ModelMetadata,
        treat_empty_input_as_default_value: bool,
    ) -> Self {
        Self {
            http_context,
            model_name,
            metadata,
            treat_empty_input_as_default_value,
        }
    }

    /// Returns the request context.
    #[must_use]
    pub const fn http_context(&self) -> &'a HttpContext {
        self.http_context
    }

    /// Returns the name of the model being bound.
    #[must_use]
    pub const fn model_name(&self) -> &'a str {
        self.model_name
    }

    /// Returns the target model's metadata.
    #[must_use]
    pub const fn metadata(&self) -> &'a ModelMetadata {
        self.metadata
    }

    /// Returns the target model's type ID.
    #[must_use]
    pub fn model_type(&self) -> TypeId {
        self.metadata.model_type()
    }

    /// Returns `true` if an empty body should bind the type's default value.
    #[must_use]
    pub const fn treat_empty_input_as_default_value(&self) -> bool {
        self.treat_empty_input_as_default_value
    }

    /// Returns the declared content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&'a str> {
        self.http_context.content_type()
    }

    /// Returns the declared content type parsed as a media type.
    ///
    /// Returns `None` when the header is absent or malformed.
    #[must_use]
    pub fn media_type(&self) -> Option<mime::Mime> {
        self.content_type()?.parse().ok()
    }

    /// Returns the declared `charset` parameter, lowercased.
    #[must_use]
    pub fn charset(&self) -> Option<String> {
        self.media_type()?
            .get_param(mime::CHARSET)
            .map(|charset| charset.as_str().to_ascii_lowercase())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &'a RequestBody {
        self.http_context.body()
    }
}
