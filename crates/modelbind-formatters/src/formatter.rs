//! The input formatter contract.

use crate::context::InputFormatterContext;
use crate::error::ReadError;
use async_trait::async_trait;
use modelbind_core::{Model, ModelMetadata};
use std::any::Any;
use std::fmt;

/// Result of a successful formatter read.
///
/// Failures travel through [`ReadError`], never through this type.
pub enum InputFormatterResult {
    /// The body was read. The value may be absent (e.g. a JSON `null`).
    Success(Option<Model>),
    /// The body contained nothing usable.
    NoValue,
}

impl InputFormatterResult {
    /// A successful read producing `value`.
    #[must_use]
    pub fn success<T: Any + Send + Sync>(value: T) -> Self {
        Self::Success(Some(Box::new(value)))
    }

    /// A successful read producing an already boxed model.
    #[must_use]
    pub fn success_model(model: Option<Model>) -> Self {
        Self::Success(model)
    }

    /// A successful read producing the model type's default value.
    #[must_use]
    pub fn success_default(metadata: &ModelMetadata) -> Self {
        Self::Success(metadata.default_value())
    }

    /// A read that found no usable value.
    #[must_use]
    pub const fn no_value() -> Self {
        Self::NoValue
    }

    /// Returns `true` for [`Self::Success`].
    #[must_use]
    pub const fn is_model_set(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl fmt::Debug for InputFormatterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(model) => f
                .debug_struct("Success")
                .field("has_model", &model.is_some())
                .finish(),
            Self::NoValue => f.write_str("NoValue"),
        }
    }
}

/// Reads a request body into a model.
///
/// Formatters are registered once and shared by all concurrent requests, so
/// implementations must not keep per-request mutable state.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use modelbind_formatters::{InputFormatter, InputFormatterContext, InputFormatterResult, ReadError};
///
/// struct PlainText;
///
/// #[async_trait]
/// impl InputFormatter for PlainText {
///     fn can_read(&self, context: &InputFormatterContext<'_>) -> bool {
///         context.media_type().is_some_and(|m| m.essence_str() == "text/plain")
///     }
///
///     async fn read(&self, context: &InputFormatterContext<'_>) -> Result<InputFormatterResult, ReadError> {
///         let bytes = context.body().read_to_end().await?;
///         Ok(InputFormatterResult::success(String::from_utf8_lossy(&bytes).into_owned()))
///     }
/// }
/// ```
#[async_trait]
pub trait InputFormatter: Send + Sync + 'static {
    /// Name used in diagnostics. Defaults to the Rust type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns `true` if this formatter can read the request into the model.
    fn can_read(&self, context: &InputFormatterContext<'_>) -> bool;

    /// Reads the request body.
    async fn read(
        &self,
        context: &InputFormatterContext<'_>,
    ) -> Result<InputFormatterResult, ReadError>;

    /// Treat every failure from this formatter as a client input error.
    ///
    /// When `true`, non-format errors are recorded in model state instead of
    /// propagating, regardless of the binder-wide setting.
    fn send_bad_request_for_exceptions_during_deserialization(&self) -> bool {
        false
    }
}
