//! Reusable base for text-based formatters.
//!
//! [`TextInputFormatter`] does the parts every text formatter shares:
//! media type matching, the empty-body policy, charset selection and
//! decoding. The format-specific work is delegated to a [`TextBodyReader`].

use crate::context::InputFormatterContext;
use crate::error::{InputFormatError, ReadError};
use crate::formatter::{InputFormatter, InputFormatterResult};
use crate::media_type::MediaTypeCollection;
use async_trait::async_trait;
use modelbind_core::{ModelMetadata, UnsupportedContentTypeError};
use std::fmt;

/// Text encodings a formatter can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-8.
    Utf8,
    /// 7-bit US-ASCII.
    UsAscii,
    /// ISO-8859-1 (Latin-1).
    Latin1,
}

impl TextEncoding {
    /// Looks up an encoding by charset label, ignoring case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "us-ascii" | "ascii" => Some(Self::UsAscii),
            "iso-8859-1" | "latin1" | "latin-1" => Some(Self::Latin1),
            _ => None,
        }
    }

    /// Returns the canonical charset label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::UsAscii => "us-ascii",
            Self::Latin1 => "iso-8859-1",
        }
    }

    /// Decodes `bytes`.
    ///
    /// # Errors
    ///
    /// Returns a format error if the bytes are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String, InputFormatError> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|err| {
                InputFormatError::with_source("The request body is not valid UTF-8.", err)
            }),
            Self::UsAscii => {
                if bytes.is_ascii() {
                    Ok(bytes.iter().map(|&b| char::from(b)).collect())
                } else {
                    Err(InputFormatError::new("The request body is not valid US-ASCII."))
                }
            }
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Format-specific half of a [`TextInputFormatter`].
#[async_trait]
pub trait TextBodyReader: Send + Sync + 'static {
    /// Returns `true` if this reader can produce the described model.
    fn can_read_type(&self, metadata: &ModelMetadata) -> bool {
        let _ = metadata;
        true
    }

    /// Converts the decoded body text into a model.
    async fn read_text(
        &self,
        context: &InputFormatterContext<'_>,
        text: String,
    ) -> Result<InputFormatterResult, ReadError>;
}

/// A [`TextBodyReader`] backed by a closure.
pub struct FnTextReader<F>(F);

impl<F> FnTextReader<F>
where
    F: for<'a, 'b> Fn(&'a InputFormatterContext<'b>, String) -> Result<InputFormatterResult, ReadError>
        + Send
        + Sync
        + 'static,
{
    /// Wraps a closure.
    pub const fn new(read: F) -> Self {
        Self(read)
    }
}

#[async_trait]
impl<F> TextBodyReader for FnTextReader<F>
where
    F: for<'a, 'b> Fn(&'a InputFormatterContext<'b>, String) -> Result<InputFormatterResult, ReadError>
        + Send
        + Sync
        + 'static,
{
    async fn read_text(
        &self,
        context: &InputFormatterContext<'_>,
        text: String,
    ) -> Result<InputFormatterResult, ReadError> {
        (self.0)(context, text)
    }
}

/// Input formatter for text bodies in a set of media types and encodings.
///
/// # Reading
///
/// 1. An empty body (`Content-Length: 0` or no bytes) yields the model's
///    default when empty input is allowed, and `NoValue` otherwise.
/// 2. The request charset selects the encoding; without one, the first
///    supported encoding is used.
/// 3. The decoded text is handed to the reader.
///
/// # Example
///
/// ```rust
/// use modelbind_formatters::{InputFormatterResult, TextEncoding, TextInputFormatter};
///
/// let formatter = TextInputFormatter::from_fn(|_ctx, text| {
///     Ok(InputFormatterResult::success(text.to_uppercase()))
/// })
/// .with_media_type("text/xyz")
/// .unwrap()
/// .with_encoding(TextEncoding::Utf8);
///
/// assert_eq!(formatter.supported_encodings(), &[TextEncoding::Utf8]);
/// ```
pub struct TextInputFormatter<R> {
    name: String,
    reader: R,
    media_types: MediaTypeCollection,
    encodings: Vec<TextEncoding>,
    send_bad_request_for_exceptions: bool,
}

impl<R: TextBodyReader> TextInputFormatter<R> {
    /// Creates a formatter with no media types or encodings.
    pub fn new(reader: R) -> Self {
        Self {
            name: std::any::type_name::<R>().to_string(),
            reader,
            media_types: MediaTypeCollection::new(),
            encodings: Vec::new(),
            send_bad_request_for_exceptions: false,
        }
    }

    /// Sets the name used in diagnostics.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a supported media type.
    ///
    /// # Errors
    ///
    /// Returns an error if `media_type` cannot be parsed.
    pub fn with_media_type(mut self, media_type: &str) -> Result<Self, mime::FromStrError> {
        self.media_types.add(media_type)?;
        Ok(self)
    }

    /// Adds a supported encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        if !self.encodings.contains(&encoding) {
            self.encodings.push(encoding);
        }
        self
    }

    /// Treats every failure from this formatter as a client input error.
    #[must_use]
    pub fn with_send_bad_request_for_exceptions(mut self, enabled: bool) -> Self {
        self.send_bad_request_for_exceptions = enabled;
        self
    }

    /// Returns the supported media types.
    #[must_use]
    pub fn supported_media_types(&self) -> &MediaTypeCollection {
        &self.media_types
    }

    /// Returns the supported encodings in preference order.
    #[must_use]
    pub fn supported_encodings(&self) -> &[TextEncoding] {
        &self.encodings
    }

    /// Returns the reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    fn select_encoding(
        &self,
        context: &InputFormatterContext<'_>,
    ) -> Result<TextEncoding, ReadError> {
        let Some(&first) = self.encodings.first() else {
            return Err(ReadError::other(format!(
                "No encoding found for input formatter '{}'. There must be at least one \
                 supported encoding registered in order for the formatter to read content.",
                self.name
            )));
        };

        match context.charset() {
            None => Ok(first),
            Some(charset) => TextEncoding::from_label(&charset)
                .filter(|encoding| self.encodings.contains(encoding))
                .ok_or_else(|| {
                    let content_type = context.content_type().unwrap_or_default();
                    let unsupported = UnsupportedContentTypeError::new(content_type);
                    ReadError::from(InputFormatError::with_source(
                        unsupported.to_string(),
                        unsupported,
                    ))
                }),
        }
    }
}

impl<F> TextInputFormatter<FnTextReader<F>>
where
    F: for<'a, 'b> Fn(&'a InputFormatterContext<'b>, String) -> Result<InputFormatterResult, ReadError>
        + Send
        + Sync
        + 'static,
{
    /// Creates a formatter whose body conversion is a closure.
    ///
    /// The formatter starts with UTF-8 as its only encoding.
    pub fn from_fn(read: F) -> Self {
        Self::new(FnTextReader::new(read))
            .with_name("TextInputFormatter")
            .with_encoding(TextEncoding::Utf8)
    }
}

#[async_trait]
impl<R: TextBodyReader> InputFormatter for TextInputFormatter<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_read(&self, context: &InputFormatterContext<'_>) -> bool {
        let Some(media_type) = context.media_type() else {
            return false;
        };
        self.media_types.matches(&media_type) && self.reader.can_read_type(context.metadata())
    }

    async fn read(
        &self,
        context: &InputFormatterContext<'_>,
    ) -> Result<InputFormatterResult, ReadError> {
        if context.http_context().content_length() == Some(0) {
            return Ok(empty_body_result(context));
        }

        let bytes = context.body().read_to_end().await?;
        if bytes.is_empty() {
            return Ok(empty_body_result(context));
        }

        let encoding = self.select_encoding(context)?;
        let text = encoding.decode(&bytes)?;
        self.reader.read_text(context, text).await
    }

    fn send_bad_request_for_exceptions_during_deserialization(&self) -> bool {
        self.send_bad_request_for_exceptions
    }
}

fn empty_body_result(context: &InputFormatterContext<'_>) -> InputFormatterResult {
    if context.treat_empty_input_as_default_value() {
        InputFormatterResult::success_default(context.metadata())
    } else {
        InputFormatterResult::no_value()
    }
}

impl<R> fmt::Debug for TextInputFormatter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextInputFormatter")
            .field("name", &self.name)
            .field("media_types", &self.media_types)
            .field("encodings", &self.encodings)
            .field("send_bad_request_for_exceptions", &self.send_bad_request_for_exceptions)
            .finish_non_exhaustive()
    }
}
