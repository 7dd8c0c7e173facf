//! The request form limits policy filter.
//!
//! Several form limits declarations can apply to one action: a global
//! default, one on the controller and one on the action. Each becomes a
//! [`RequestFormLimitsFilter`] and all of them run at authorization time,
//! before the body is read. Exactly one, the most effective, installs its
//! limits:
//!
//! 1. The candidate with the highest [`FilterScope`] governs.
//! 2. On a tie, the candidate registered last governs.
//!
//! ```text
//! [Global P1] [Action P2]      P1 -> Superseded, P2 -> Applied
//! [Action P1] [Action P2]      P1 -> Superseded, P2 -> Applied
//! [Action P1] [Global P2]      P1 -> Applied,    P2 -> Superseded
//! ```

use crate::error::LimitsError;
use crate::feature::FormFeature;
use crate::options::FormOptions;
use modelbind_core::{DiagnosticEvent, DiagnosticSink, HttpContext, TracingDiagnostics};
use modelbind_telemetry::record_form_limits;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a filter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(Uuid);

impl FilterId {
    /// Creates a new unique filter ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FilterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a declaration was made. Later variants are more specific.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterScope {
    /// Applies to every action.
    Global,
    /// Declared on a controller.
    Controller,
    /// Declared on the action itself.
    #[default]
    Action,
}

/// A candidate in the per-request filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDescriptor {
    id: FilterId,
    scope: FilterScope,
}

impl FilterDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub const fn new(id: FilterId, scope: FilterScope) -> Self {
        Self { id, scope }
    }

    /// Returns the filter identity.
    #[must_use]
    pub const fn id(&self) -> FilterId {
        self.id
    }

    /// Returns the filter scope.
    #[must_use]
    pub const fn scope(&self) -> FilterScope {
        self.scope
    }
}

/// Context handed to authorization-stage filters.
#[derive(Debug)]
pub struct AuthorizationFilterContext<'a> {
    http_context: &'a mut HttpContext,
    filters: &'a [FilterDescriptor],
}

impl<'a> AuthorizationFilterContext<'a> {
    /// Creates a context for one request and its candidate filters, in
    /// registration order.
    pub fn new(http_context: &'a mut HttpContext, filters: &'a [FilterDescriptor]) -> Self {
        Self {
            http_context,
            filters,
        }
    }

    /// Returns the request.
    #[must_use]
    pub fn http_context(&self) -> &HttpContext {
        &*self.http_context
    }

    /// Returns the request mutably.
    pub fn http_context_mut(&mut self) -> &mut HttpContext {
        &mut *self.http_context
    }

    /// Returns the candidate filters.
    #[must_use]
    pub const fn filters(&self) -> &'a [FilterDescriptor] {
        self.filters
    }
}

/// What a filter did for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormLimitsOutcome {
    /// The filter installed its limits.
    Applied,
    /// The filter governs, but the form had already been read.
    AlreadyRead,
    /// Another filter governs this request.
    Superseded,
}

impl FormLimitsOutcome {
    /// Returns the metrics label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyRead => "already_read",
            Self::Superseded => "superseded",
        }
    }
}

/// Installs form limits on the request if it is the governing policy.
///
/// Each filter is a distinct policy with its own [`FilterId`], so filters
/// are not `Clone`; share one through an `Arc` instead.
pub struct RequestFormLimitsFilter {
    id: FilterId,
    options: FormOptions,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl RequestFormLimitsFilter {
    /// Creates a filter with a fresh identity.
    #[must_use]
    pub fn new(options: FormOptions) -> Self {
        Self {
            id: FilterId::new(),
            options,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Sets the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the filter identity.
    #[must_use]
    pub const fn id(&self) -> FilterId {
        self.id
    }

    /// Returns the limits this filter installs.
    #[must_use]
    pub const fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Returns the descriptor for registering this filter at `scope`.
    #[must_use]
    pub const fn descriptor(&self, scope: FilterScope) -> FilterDescriptor {
        FilterDescriptor::new(self.id, scope)
    }

    /// Finds the filter that governs the request.
    ///
    /// # Errors
    ///
    /// Returns [`LimitsError::PolicyNotRegistered`] if this filter is not a
    /// candidate.
    pub fn governing_policy(&self, filters: &[FilterDescriptor]) -> Result<FilterId, LimitsError> {
        if !filters.iter().any(|descriptor| descriptor.id == self.id) {
            return Err(LimitsError::PolicyNotRegistered(self.id));
        }

        filters
            .iter()
            .enumerate()
            .max_by_key(|(position, descriptor)| (descriptor.scope, *position))
            .map(|(_, descriptor)| descriptor.id)
            .ok_or(LimitsError::PolicyNotRegistered(self.id))
    }

    /// Runs the filter for one request.
    ///
    /// # Errors
    ///
    /// Returns [`LimitsError::PolicyNotRegistered`] if this filter is not in
    /// the context's candidate list.
    pub fn on_authorization(
        &self,
        context: &mut AuthorizationFilterContext<'_>,
    ) -> Result<FormLimitsOutcome, LimitsError> {
        let governing = self.governing_policy(context.filters())?;

        let outcome = if governing == self.id {
            self.apply_to(context.http_context_mut())
        } else {
            self.diagnostics
                .emit(DiagnosticEvent::FormLimitsPolicyPreempted {
                    skipped: self.id.to_string(),
                    governing: governing.to_string(),
                });
            FormLimitsOutcome::Superseded
        };

        record_form_limits(outcome.as_str());
        Ok(outcome)
    }

    fn apply_to(&self, http_context: &mut HttpContext) -> FormLimitsOutcome {
        let already_read = http_context
            .features()
            .get::<FormFeature>()
            .is_some_and(FormFeature::has_form);

        if already_read {
            self.diagnostics
                .emit(DiagnosticEvent::CannotApplyRequestFormLimits);
            return FormLimitsOutcome::AlreadyRead;
        }

        http_context
            .features_mut()
            .insert(FormFeature::new(self.options.clone()));
        self.diagnostics.emit(DiagnosticEvent::AppliedRequestFormLimits);
        FormLimitsOutcome::Applied
    }
}

impl fmt::Debug for RequestFormLimitsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFormLimitsFilter")
            .field("id", &self.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The form limits filters registered for one action.
///
/// # Example
///
/// ```rust
/// use modelbind_core::HttpContext;
/// use modelbind_limits::{FilterScope, FormLimitsOutcome, FormLimitsPolicies, RequestFormLimits};
///
/// let mut policies = FormLimitsPolicies::new();
/// policies.register(RequestFormLimits::new().build_filter(), FilterScope::Global);
/// policies.register(RequestFormLimits::new().value_count_limit(5).build_filter(), FilterScope::Action);
///
/// let mut http = HttpContext::default();
/// let outcomes = policies.apply(&mut http).unwrap();
/// assert_eq!(outcomes, vec![FormLimitsOutcome::Superseded, FormLimitsOutcome::Applied]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormLimitsPolicies {
    filters: Vec<Arc<RequestFormLimitsFilter>>,
    descriptors: Vec<FilterDescriptor>,
}

impl FormLimitsPolicies {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter at `scope`, returning its identity.
    pub fn register(&mut self, filter: RequestFormLimitsFilter, scope: FilterScope) -> FilterId {
        let id = filter.id();
        self.descriptors.push(filter.descriptor(scope));
        self.filters.push(Arc::new(filter));
        id
    }

    /// Returns the candidate list, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    /// Returns the number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs every filter against the request, in registration order.
    ///
    /// # Errors
    ///
    /// Propagates the first [`LimitsError`].
    pub fn apply(
        &self,
        http_context: &mut HttpContext,
    ) -> Result<Vec<FormLimitsOutcome>, LimitsError> {
        let mut context = AuthorizationFilterContext::new(http_context, &self.descriptors);
        self.filters
            .iter()
            .map(|filter| filter.on_authorization(&mut context))
            .collect()
    }
}
