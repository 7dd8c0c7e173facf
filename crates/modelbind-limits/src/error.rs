//! Error types for form limits and form reading.

use crate::filter::FilterId;
use thiserror::Error;

/// Errors raised while resolving form limits policies.
///
/// These indicate a composition bug and are never recorded as model state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitsError {
    /// A filter ran for a request whose candidate list does not contain it.
    #[error("form limits policy '{0}' is not registered for the current request")]
    PolicyNotRegistered(FilterId),
}

/// Errors raised while reading a form body.
#[derive(Debug, Error)]
pub enum FormError {
    /// The request is neither url-encoded nor multipart form data.
    #[error("Incorrect Content-Type: {0}")]
    UnsupportedContentType(String),

    /// More form values than `value_count_limit`.
    #[error("Form value count limit {limit} exceeded.")]
    TooManyValues {
        /// The configured limit.
        limit: usize,
    },

    /// A key longer than `key_length_limit`.
    #[error("Form key length limit {limit} exceeded.")]
    KeyTooLong {
        /// The configured limit.
        limit: usize,
    },

    /// A value longer than `value_length_limit`.
    #[error("Form value length limit {limit} exceeded.")]
    ValueTooLong {
        /// The configured limit.
        limit: usize,
    },

    /// The body exceeded the buffering or multipart body limit.
    #[error("Request body too large. The max request body size is {limit} bytes.")]
    BodyTooLarge {
        /// The configured limit.
        limit: u64,
    },

    /// The multipart boundary exceeded `multipart_boundary_length_limit`.
    #[error("Multipart boundary length limit {limit} exceeded.")]
    BoundaryTooLong {
        /// The configured limit.
        limit: usize,
    },

    /// A multipart section declared more headers than allowed.
    #[error("Multipart header count limit {limit} exceeded.")]
    TooManyHeaders {
        /// The configured limit.
        limit: usize,
    },

    /// A multipart section's headers were longer than allowed.
    #[error("Multipart header length limit {limit} exceeded.")]
    HeadersTooLong {
        /// The configured limit.
        limit: usize,
    },

    /// The body could not be parsed as a form.
    #[error("Malformed form body: {0}")]
    Malformed(String),

    /// The multipart parser failed.
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] multer::Error),

    /// A form was already read or assigned for this request.
    #[error("The request form has already been read.")]
    AlreadyRead,

    /// Reading the body failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
