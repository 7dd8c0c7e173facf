//! Field-keyed model-state errors.

use crate::error::BoxError;
use indexmap::IndexMap;
use std::error::Error as StdError;
use std::sync::Arc;

/// Default cap on recorded errors per dictionary.
pub const DEFAULT_MAX_ALLOWED_ERRORS: usize = 200;

const TOO_MANY_ERRORS_MESSAGE: &str =
    "The maximum number of allowed model errors has been reached.";

/// A single model-state error.
///
/// Carries the user-facing message and, when the error came from a failure,
/// the originating error for downstream inspection.
#[derive(Debug, Clone)]
pub struct ModelError {
    error_message: String,
    exception: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ModelError {
    /// Creates an error with a message only.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            exception: None,
        }
    }

    /// Creates an error from an originating failure.
    ///
    /// The message is the failure's display text.
    #[must_use]
    pub fn from_exception(exception: Arc<dyn StdError + Send + Sync>) -> Self {
        Self {
            error_message: exception.to_string(),
            exception: Some(exception),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Returns the originating error, if any.
    #[must_use]
    pub fn exception(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.exception.as_deref()
    }

    /// Returns the originating error as a shared handle.
    #[must_use]
    pub fn exception_arc(&self) -> Option<Arc<dyn StdError + Send + Sync>> {
        self.exception.clone()
    }
}

/// The errors recorded under one key.
#[derive(Debug, Clone, Default)]
pub struct ModelStateEntry {
    errors: Vec<ModelError>,
}

impl ModelStateEntry {
    /// Returns the recorded errors in insertion order.
    #[must_use]
    pub fn errors(&self) -> &[ModelError] {
        &self.errors
    }

    /// Returns `true` if this entry has no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Insertion-ordered map from field key to model-state entry.
///
/// The empty string is a valid key; it is used for errors on an unnamed
/// top-level model.
///
/// # Example
///
/// ```
/// use modelbind_core::ModelStateDictionary;
///
/// let mut state = ModelStateDictionary::new();
/// state.add_model_error("", "A non-empty request body is required.");
///
/// assert!(!state.is_valid());
/// let (key, entry) = state.iter().next().unwrap();
/// assert_eq!(key, "");
/// assert_eq!(entry.errors()[0].error_message(), "A non-empty request body is required.");
/// ```
#[derive(Debug, Clone)]
pub struct ModelStateDictionary {
    entries: IndexMap<String, ModelStateEntry>,
    error_count: usize,
    max_allowed_errors: usize,
    has_reached_max_errors: bool,
}

impl ModelStateDictionary {
    /// Creates an empty dictionary with the default error cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_allowed_errors(DEFAULT_MAX_ALLOWED_ERRORS)
    }

    /// Creates an empty dictionary with a custom error cap.
    ///
    /// A cap of zero is treated as one.
    #[must_use]
    pub fn with_max_allowed_errors(max_allowed_errors: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            error_count: 0,
            max_allowed_errors: max_allowed_errors.max(1),
            has_reached_max_errors: false,
        }
    }

    /// Records an error message under `key`.
    ///
    /// Returns `false` if the error was dropped because the cap was reached.
    pub fn add_model_error(&mut self, key: impl Into<String>, message: impl Into<String>) -> bool {
        self.try_add(key.into(), ModelError::new(message))
    }

    /// Records an originating failure under `key`.
    ///
    /// Returns `false` if the error was dropped because the cap was reached.
    pub fn add_model_exception(
        &mut self,
        key: impl Into<String>,
        exception: Arc<dyn StdError + Send + Sync>,
    ) -> bool {
        self.try_add(key.into(), ModelError::from_exception(exception))
    }

    /// Records a boxed failure under `key`.
    pub fn add_boxed_exception(&mut self, key: impl Into<String>, exception: BoxError) -> bool {
        self.add_model_exception(key, Arc::from(exception))
    }

    fn try_add(&mut self, key: String, error: ModelError) -> bool {
        if self.error_count >= self.max_allowed_errors {
            return false;
        }

        if self.error_count + 1 == self.max_allowed_errors {
            self.entries
                .entry(String::new())
                .or_default()
                .errors
                .push(ModelError::new(TOO_MANY_ERRORS_MESSAGE));
            self.error_count += 1;
            self.has_reached_max_errors = true;
            return false;
        }

        self.entries.entry(key).or_default().errors.push(error);
        self.error_count += 1;
        true
    }

    /// Returns the entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModelStateEntry> {
        self.entries.get(key)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelStateEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the total number of recorded errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.error_count
    }

    /// Returns the configured error cap.
    #[must_use]
    pub const fn max_allowed_errors(&self) -> usize {
        self.max_allowed_errors
    }

    /// Returns `true` once the error cap has been reached.
    #[must_use]
    pub const fn has_reached_max_errors(&self) -> bool {
        self.has_reached_max_errors
    }

    /// Returns `true` if no errors have been recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.entries.values().all(ModelStateEntry::is_valid)
    }

    /// Removes every entry and resets the error count.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.error_count = 0;
        self.has_reached_max_errors = false;
    }
}

impl Default for ModelStateDictionary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl StdError for Boom {}

    #[test]
    fn test_errors_grouped_by_key_in_order() {
        let mut state = ModelStateDictionary::new();
        state.add_model_error("b", "first");
        state.add_model_error("a", "second");
        state.add_model_error("b", "third");

        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(state.get("b").unwrap().errors().len(), 2);
        assert_eq!(state.error_count(), 3);
        assert!(!state.is_valid());
    }

    #[test]
    fn test_exception_keeps_original_error() {
        let mut state = ModelStateDictionary::new();
        let original: Arc<dyn StdError + Send + Sync> = Arc::new(Boom);
        state.add_model_exception("", Arc::clone(&original));

        let error = &state.get("").unwrap().errors()[0];
        assert_eq!(error.error_message(), "boom");
        assert!(error.exception().unwrap().downcast_ref::<Boom>().is_some());
        assert!(Arc::ptr_eq(&error.exception_arc().unwrap(), &original));
    }

    #[test]
    fn test_error_cap_records_marker_once() {
        let mut state = ModelStateDictionary::with_max_allowed_errors(3);
        assert!(state.add_model_error("x", "1"));
        assert!(state.add_model_error("x", "2"));
        assert!(!state.add_model_error("x", "3"));
        assert!(!state.add_model_error("x", "4"));

        assert!(state.has_reached_max_errors());
        assert_eq!(state.error_count(), 3);
        let marker = &state.get("").unwrap().errors()[0];
        assert_eq!(marker.error_message(), TOO_MANY_ERRORS_MESSAGE);
    }

    #[test]
    fn test_clear_resets_state() {
        let mut state = ModelStateDictionary::new();
        state.add_model_error("x", "bad");
        state.clear();

        assert!(state.is_empty());
        assert!(state.is_valid());
        assert_eq!(state.error_count(), 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_error_count_is_capped(cap in 1usize..20, adds in 0usize..40) {
            let mut state = ModelStateDictionary::with_max_allowed_errors(cap);
            for i in 0..adds {
                state.add_model_error(format!("k{}", i % 3), "bad");
            }

            proptest::prop_assert_eq!(state.error_count(), adds.min(cap));
            proptest::prop_assert_eq!(state.has_reached_max_errors(), adds >= cap);
        }
    }
}
