//! Formatter error types.
//!
//! A formatter reports failure through two channels:
//!
//! - [`InputFormatError`]: the body violated the expected format. This is a
//!   client problem and always becomes a model-state error.
//! - [`ReadError::Other`]: anything else (I/O, bugs, exhausted resources).
//!   These propagate to the host unless a policy downgrades them.

use modelbind_core::BoxError;
use std::io;
use thiserror::Error;

/// The request body did not match the format a formatter expects.
///
/// # Example
///
/// ```rust
/// use modelbind_formatters::InputFormatError;
/// use std::error::Error;
///
/// let cause = "abc".parse::<u32>().unwrap_err();
/// let err = InputFormatError::with_source("Your input is bad!", cause);
/// assert_eq!(err.to_string(), "Your input is bad!");
/// assert!(err.source().is_some());
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InputFormatError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl InputFormatError {
    /// Creates an error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error with a message and an underlying cause.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

/// Failure returned by [`InputFormatter::read`](crate::InputFormatter::read).
#[derive(Debug, Error)]
pub enum ReadError {
    /// The body was malformed.
    #[error(transparent)]
    Format(#[from] InputFormatError),

    /// Any other failure, carried unchanged.
    #[error(transparent)]
    Other(BoxError),
}

impl ReadError {
    /// Wraps an arbitrary failure.
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }

    /// Returns `true` for a malformed-body error.
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Returns the error to record or propagate.
    ///
    /// A format error is boxed as an [`InputFormatError`]. Any other error is
    /// returned exactly as the formatter produced it.
    #[must_use]
    pub fn into_boxed(self) -> BoxError {
        match self {
            Self::Format(err) => Box::new(err),
            Self::Other(err) => err,
        }
    }
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
