//! Binder-wide options.

use serde::{Deserialize, Serialize};

/// Options read once when the body binder is composed.
///
/// Both flags default to `false`.
///
/// # Example
///
/// ```rust
/// use modelbind_binder::BodyBindingOptions;
///
/// let options = BodyBindingOptions::default().with_allow_empty_input(true);
/// assert!(options.allow_empty_input_in_body_binding);
/// assert!(!options.send_bad_request_for_all_formatter_exceptions);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BodyBindingOptions {
    /// Treat an empty body as the model type's default value instead of
    /// reporting a missing body.
    pub allow_empty_input_in_body_binding: bool,

    /// Record every formatter failure as a model-state error instead of
    /// propagating non-format failures.
    pub send_bad_request_for_all_formatter_exceptions: bool,
}

impl BodyBindingOptions {
    /// Creates options with both flags off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether empty input binds the default value.
    #[must_use]
    pub const fn with_allow_empty_input(mut self, enabled: bool) -> Self {
        self.allow_empty_input_in_body_binding = enabled;
        self
    }

    /// Sets whether all formatter failures become model-state errors.
    #[must_use]
    pub const fn with_send_bad_request_for_all_exceptions(mut self, enabled: bool) -> Self {
        self.send_bad_request_for_all_formatter_exceptions = enabled;
        self
    }
}
