//! Form limit values.

use crate::filter::{FilterScope, RequestFormLimitsFilter};
use serde::{Deserialize, Serialize};

/// Default `memory_buffer_threshold`: 64 KiB.
pub const DEFAULT_MEMORY_BUFFER_THRESHOLD: usize = 64 * 1024;
/// Default `buffer_body_length_limit` and `multipart_body_length_limit`: 128 MiB.
pub const DEFAULT_BODY_LENGTH_LIMIT: u64 = 128 * 1024 * 1024;
/// Default `value_count_limit`.
pub const DEFAULT_VALUE_COUNT_LIMIT: usize = 1024;
/// Default `key_length_limit`.
pub const DEFAULT_KEY_LENGTH_LIMIT: usize = 1024 * 2;
/// Default `value_length_limit`: 4 MiB.
pub const DEFAULT_VALUE_LENGTH_LIMIT: usize = 1024 * 1024 * 4;
/// Default `multipart_boundary_length_limit`.
pub const DEFAULT_MULTIPART_BOUNDARY_LENGTH_LIMIT: usize = 128;
/// Default `multipart_headers_count_limit`.
pub const DEFAULT_MULTIPART_HEADERS_COUNT_LIMIT: usize = 16;
/// Default `multipart_headers_length_limit`: 16 KiB.
pub const DEFAULT_MULTIPART_HEADERS_LENGTH_LIMIT: usize = 1024 * 16;

/// Limits applied when the request form is read.
///
/// # Example
///
/// ```rust
/// use modelbind_limits::FormOptions;
///
/// let options: FormOptions = serde_json::from_str(r#"{"value_count_limit": 10}"#).unwrap();
/// assert_eq!(options.value_count_limit, 10);
/// assert_eq!(options.key_length_limit, 2048);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormOptions {
    /// Buffer the whole body before parsing.
    pub buffer_body: bool,
    /// Bytes kept in memory before a buffered body spills over.
    pub memory_buffer_threshold: usize,
    /// Maximum buffered body length.
    pub buffer_body_length_limit: u64,
    /// Maximum number of form values.
    pub value_count_limit: usize,
    /// Maximum key length.
    pub key_length_limit: usize,
    /// Maximum value length.
    pub value_length_limit: usize,
    /// Maximum multipart boundary length.
    pub multipart_boundary_length_limit: usize,
    /// Maximum header count per multipart section.
    pub multipart_headers_count_limit: usize,
    /// Maximum total header length per multipart section.
    pub multipart_headers_length_limit: usize,
    /// Maximum multipart body length.
    pub multipart_body_length_limit: u64,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            buffer_body: false,
            memory_buffer_threshold: DEFAULT_MEMORY_BUFFER_THRESHOLD,
            buffer_body_length_limit: DEFAULT_BODY_LENGTH_LIMIT,
            value_count_limit: DEFAULT_VALUE_COUNT_LIMIT,
            key_length_limit: DEFAULT_KEY_LENGTH_LIMIT,
            value_length_limit: DEFAULT_VALUE_LENGTH_LIMIT,
            multipart_boundary_length_limit: DEFAULT_MULTIPART_BOUNDARY_LENGTH_LIMIT,
            multipart_headers_count_limit: DEFAULT_MULTIPART_HEADERS_COUNT_LIMIT,
            multipart_headers_length_limit: DEFAULT_MULTIPART_HEADERS_LENGTH_LIMIT,
            multipart_body_length_limit: DEFAULT_BODY_LENGTH_LIMIT,
        }
    }
}

/// Declares form limits for a controller or action.
///
/// Every value starts at the [`FormOptions`] default; setters override
/// individual limits. [`build_filter`](Self::build_filter) copies all of
/// them into a new filter.
///
/// # Example
///
/// ```rust
/// use modelbind_limits::{FilterScope, RequestFormLimits};
///
/// let limits = RequestFormLimits::new()
///     .value_count_limit(10)
///     .key_length_limit(64)
///     .scope(FilterScope::Controller);
///
/// let filter = limits.build_filter();
/// assert_eq!(filter.options().value_count_limit, 10);
/// assert_eq!(filter.options().value_length_limit, 4 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct RequestFormLimits {
    options: FormOptions,
    scope: FilterScope,
}

impl RequestFormLimits {
    /// Creates a declaration with default limits at action scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing options.
    pub const fn from_options(options: FormOptions) -> Self {
        Self {
            options,
            scope: FilterScope::Action,
        }
    }

    /// Sets the specificity of the declaration.
    pub const fn scope(mut self, scope: FilterScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets `buffer_body`.
    pub const fn buffer_body(mut self, value: bool) -> Self {
        self.options.buffer_body = value;
        self
    }

    /// Sets `memory_buffer_threshold`.
    pub const fn memory_buffer_threshold(mut self, value: usize) -> Self {
        self.options.memory_buffer_threshold = value;
        self
    }

    /// Sets `buffer_body_length_limit`.
    pub const fn buffer_body_length_limit(mut self, value: u64) -> Self {
        self.options.buffer_body_length_limit = value;
        self
    }

    /// Sets `value_count_limit`.
    pub const fn value_count_limit(mut self, value: usize) -> Self {
        self.options.value_count_limit = value;
        self
    }

    /// Sets `key_length_limit`.
    pub const fn key_length_limit(mut self, value: usize) -> Self {
        self.options.key_length_limit = value;
        self
    }

    /// Sets `value_length_limit`.
    pub const fn value_length_limit(mut self, value: usize) -> Self {
        self.options.value_length_limit = value;
        self
    }

    /// Sets `multipart_boundary_length_limit`.
    pub const fn multipart_boundary_length_limit(mut self, value: usize) -> Self {
        self.options.multipart_boundary_length_limit = value;
        self
    }

    /// Sets `multipart_headers_count_limit`.
    pub const fn multipart_headers_count_limit(mut self, value: usize) -> Self {
        self.options.multipart_headers_count_limit = value;
        self
    }

    /// Sets `multipart_headers_length_limit`.
    pub const fn multipart_headers_length_limit(mut self, value: usize) -> Self {
        self.options.multipart_headers_length_limit = value;
        self
    }

    /// Sets `multipart_body_length_limit`.
    pub const fn multipart_body_length_limit(mut self, value: u64) -> Self {
        self.options.multipart_body_length_limit = value;
        self
    }

    /// Returns the declared options.
    #[must_use]
    pub const fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Returns the declared scope.
    #[must_use]
    pub const fn declared_scope(&self) -> FilterScope {
        self.scope
    }

    /// Creates a filter carrying a copy of every declared limit.
    pub fn build_filter(&self) -> RequestFormLimitsFilter {
        RequestFormLimitsFilter::new(self.options.clone())
    }
}
