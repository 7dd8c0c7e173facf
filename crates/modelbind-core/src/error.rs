//! Error types for modelbind.
//!
//! Recoverable binding problems are recorded in the
//! [`ModelStateDictionary`](crate::ModelStateDictionary) and never surface
//! here. [`BindingError`] only carries what must cross the binder boundary:
//! formatter failures that were not downgraded, and composition bugs.

use thiserror::Error;

/// Boxed, thread-safe error used to carry arbitrary failures unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias using [`BindingError`].
pub type BindingResult<T> = Result<T, BindingError>;

/// Errors that escape a model binding attempt.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A formatter failed with a non-domain error and no policy converted it.
    ///
    /// The original error is kept as-is so the hosting layer can inspect it.
    #[error(transparent)]
    Unhandled(BoxError),

    /// The binding pipeline was composed incorrectly.
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),
}

impl BindingError {
    /// Returns `true` for errors that indicate a composition bug.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::InternalConsistency(_))
    }

    /// Returns the carried formatter error, if this is an unhandled failure.
    #[must_use]
    pub fn into_unhandled(self) -> Option<BoxError> {
        match self {
            Self::Unhandled(err) => Some(err),
            Self::InternalConsistency(_) => None,
        }
    }
}

/// Recorded when no input formatter accepts the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported content type '{content_type}'.")]
pub struct UnsupportedContentTypeError {
    content_type: String,
}

impl UnsupportedContentTypeError {
    /// Creates the error for a declared content type (empty if absent).
    #[must_use]
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
        }
    }

    /// Returns the declared content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}
