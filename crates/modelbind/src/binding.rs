//! Composition of the body binder and form limits.

use modelbind_binder::{BodyBindingOptions, BodyModelBinder, BodyModelBinderProvider};
use modelbind_config::ModelBindConfig;
use modelbind_core::{
    BindingError, BindingSource, DiagnosticSink, HttpContext, ModelBindingContext, ModelMetadata,
    ModelStateDictionary, TracingDiagnostics,
};
use modelbind_formatters::{FormatterCollection, InputFormatter};
use modelbind_limits::{FilterScope, FormLimitsPolicies, FormOptions, RequestFormLimitsFilter};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Builder for [`ModelBinding`].
///
/// # Example
///
/// ```rust
/// use modelbind::prelude::*;
///
/// let binding = ModelBinding::builder()
///     .formatter(
///         TextInputFormatter::from_fn(|_ctx, text| Ok(InputFormatterResult::success(text)))
///             .with_media_type("text/plain")
///             .unwrap(),
///     )
///     .allow_empty_input(true)
///     .build();
///
/// assert_eq!(binding.body_binder().formatters().len(), 1);
/// assert!(binding.options().allow_empty_input_in_body_binding);
/// ```
#[must_use]
pub struct ModelBindingBuilder {
    formatters: FormatterCollection,
    options: BodyBindingOptions,
    form_limits: FormOptions,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Default for ModelBindingBuilder {
    fn default() -> Self {
        Self {
            formatters: FormatterCollection::new(),
            options: BodyBindingOptions::default(),
            form_limits: FormOptions::default(),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }
}

impl ModelBindingBuilder {
    /// Creates a builder with no formatters and default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the options and default form limits from loaded configuration.
    ///
    /// Formatters and the diagnostics sink are left unchanged.
    pub fn from_config(mut self, config: &ModelBindConfig) -> Self {
        self.options = config.binding;
        self.form_limits = config.form_limits.clone();
        self
    }

    /// Appends an input formatter. Earlier formatters win selection.
    pub fn formatter<F: InputFormatter>(mut self, formatter: F) -> Self {
        self.formatters.push(formatter);
        self
    }

    /// Replaces the formatter list.
    pub fn formatters(mut self, formatters: FormatterCollection) -> Self {
        self.formatters = formatters;
        self
    }

    /// Sets whether an empty body binds the model's default value.
    pub const fn allow_empty_input(mut self, allow: bool) -> Self {
        self.options.allow_empty_input_in_body_binding = allow;
        self
    }

    /// Sets whether every formatter failure becomes a model error.
    pub const fn send_bad_request_for_all_exceptions(mut self, enabled: bool) -> Self {
        self.options.send_bad_request_for_all_formatter_exceptions = enabled;
        self
    }

    /// Sets the default form limits used by [`ModelBinding::form_limits_filter`].
    pub fn form_limits(mut self, form_limits: FormOptions) -> Self {
        self.form_limits = form_limits;
        self
    }

    /// Sets the sink for binder and form limit diagnostics.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Builds the binding services.
    pub fn build(self) -> ModelBinding {
        tracing::debug!(
            formatters = self.formatters.len(),
            allow_empty_input = self.options.allow_empty_input_in_body_binding,
            send_bad_request_for_all_exceptions =
                self.options.send_bad_request_for_all_formatter_exceptions,
            "model binding configured"
        );

        let provider = BodyModelBinderProvider::with_diagnostics(
            self.formatters,
            self.options,
            Arc::clone(&self.diagnostics),
        );

        ModelBinding {
            provider,
            form_limits: self.form_limits,
            diagnostics: self.diagnostics,
        }
    }
}

impl fmt::Debug for ModelBindingBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBindingBuilder")
            .field("formatters", &self.formatters)
            .field("options", &self.options)
            .field("form_limits", &self.form_limits)
            .finish_non_exhaustive()
    }
}

/// Configured body binding and form limit services.
#[derive(Clone)]
pub struct ModelBinding {
    provider: BodyModelBinderProvider,
    form_limits: FormOptions,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ModelBinding {
    /// Creates a builder.
    pub fn builder() -> ModelBindingBuilder {
        ModelBindingBuilder::new()
    }

    /// Returns the shared body binder.
    #[must_use]
    pub fn body_binder(&self) -> &Arc<BodyModelBinder> {
        self.provider.binder()
    }

    /// Returns the binder provider.
    #[must_use]
    pub const fn provider(&self) -> &BodyModelBinderProvider {
        &self.provider
    }

    /// Returns the body binding options.
    #[must_use]
    pub fn options(&self) -> &BodyBindingOptions {
        self.body_binder().options()
    }

    /// Returns the default form limits.
    #[must_use]
    pub const fn default_form_limits(&self) -> &FormOptions {
        &self.form_limits
    }

    /// Creates a form limits filter carrying the default limits and
    /// reporting to the configured diagnostics sink.
    #[must_use]
    pub fn form_limits_filter(&self) -> RequestFormLimitsFilter {
        RequestFormLimitsFilter::new(self.form_limits.clone())
            .with_diagnostics(Arc::clone(&self.diagnostics))
    }

    /// Creates a policy list holding [`form_limits_filter`](Self::form_limits_filter)
    /// at `scope`. Callers register more specific filters on top.
    ///
    /// ```rust
    /// use modelbind::prelude::*;
    ///
    /// let binding = ModelBinding::builder().build();
    /// let mut policies = binding.form_limits_policies(FilterScope::Global);
    /// policies.register(RequestFormLimits::new().value_count_limit(8).build_filter(), FilterScope::Action);
    ///
    /// let mut http = HttpContext::default();
    /// let outcomes = policies.apply(&mut http).unwrap();
    /// assert_eq!(outcomes, [FormLimitsOutcome::Superseded, FormLimitsOutcome::Applied]);
    /// ```
    #[must_use]
    pub fn form_limits_policies(&self, scope: FilterScope) -> FormLimitsPolicies {
        let mut policies = FormLimitsPolicies::new();
        policies.register(self.form_limits_filter(), scope);
        policies
    }

    /// Binds a top-level `T` named `model_name` from the request body.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Unhandled`] for formatter failures that are
    /// not converted to model errors, and
    /// [`BindingError::InternalConsistency`] if no formatters are registered.
    pub async fn bind_body<T: Any + Send + Sync>(
        &self,
        http_context: &HttpContext,
        model_name: &str,
    ) -> Result<BodyBinding<T>, BindingError> {
        let metadata = ModelMetadata::for_type::<T>().with_binding_source(BindingSource::Body);
        let binder = self
            .provider
            .get_binder(&metadata)
            .map_err(|err| BindingError::InternalConsistency(err.to_string()))?
            .ok_or_else(|| {
                BindingError::InternalConsistency("body binder was not selected".to_string())
            })?;

        let mut model_state = ModelStateDictionary::new();
        let mut context =
            ModelBindingContext::top_level(http_context, &mut model_state, metadata, model_name);
        binder.bind_model(&mut context).await?;
        let result = context.into_result();

        let is_model_set = result.is_model_set();
        let model = result
            .into_model()
            .and_then(|model| model.downcast::<T>().ok())
            .map(|model| *model);

        Ok(BodyBinding {
            model,
            is_model_set,
            model_state,
        })
    }
}

impl fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBinding")
            .field("provider", &self.provider)
            .field("form_limits", &self.form_limits)
            .finish_non_exhaustive()
    }
}

/// The outcome of [`ModelBinding::bind_body`].
#[derive(Debug)]
pub struct BodyBinding<T> {
    model: Option<T>,
    is_model_set: bool,
    model_state: ModelStateDictionary,
}

impl<T> BodyBinding<T> {
    /// Returns the bound model.
    ///
    /// `None` when binding failed, when the formatter produced no value, or
    /// when it produced a value of another type.
    #[must_use]
    pub const fn model(&self) -> Option<&T> {
        self.model.as_ref()
    }

    /// Returns `true` if the binder reported success.
    #[must_use]
    pub const fn is_model_set(&self) -> bool {
        self.is_model_set
    }

    /// Returns the model state populated during binding.
    #[must_use]
    pub const fn model_state(&self) -> &ModelStateDictionary {
        &self.model_state
    }

    /// Returns `true` if binding recorded no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.model_state.is_valid()
    }

    /// Splits the outcome into the model and the model state.
    #[must_use]
    pub fn into_parts(self) -> (Option<T>, ModelStateDictionary) {
        (self.model, self.model_state)
    }
}
