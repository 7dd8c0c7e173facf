//! Model binding context, result and binder trait.

use crate::context::HttpContext;
use crate::error::BindingError;
use crate::metadata::{BindingSource, ModelMetadata};
use crate::model_state::ModelStateDictionary;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;

/// A bound model value.
pub type Model = Box<dyn Any + Send + Sync>;

/// The outcome of a binding attempt.
///
/// `is_model_set` distinguishes "bound to nothing" from "not bound": a
/// successful binding may still carry no value.
#[derive(Default)]
pub struct ModelBindingResult {
    model: Option<Model>,
    is_model_set: bool,
}

impl ModelBindingResult {
    /// A binding that did not produce a model.
    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }

    /// A binding that produced `model`.
    #[must_use]
    pub fn success(model: Option<Model>) -> Self {
        Self {
            model,
            is_model_set: true,
        }
    }

    /// Returns `true` if the model was set.
    #[must_use]
    pub const fn is_model_set(&self) -> bool {
        self.is_model_set
    }

    /// Returns the model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.model.as_deref()
    }

    /// Returns the model as `T`, if it is one.
    #[must_use]
    pub fn model_as<T: Any>(&self) -> Option<&T> {
        self.model.as_ref().and_then(|model| model.downcast_ref())
    }

    /// Takes ownership of the model.
    #[must_use]
    pub fn into_model(self) -> Option<Model> {
        self.model
    }
}

impl fmt::Debug for ModelBindingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBindingResult")
            .field("is_model_set", &self.is_model_set)
            .field("has_model", &self.model.is_some())
            .finish()
    }
}

/// Input and output of a single binding attempt.
///
/// The model state is borrowed from the caller so that several bindings for
/// the same action share one dictionary.
///
/// # Example
///
/// ```
/// use modelbind_core::{HttpContext, ModelBindingContext, ModelMetadata, ModelStateDictionary};
///
/// struct Person;
///
/// let http = HttpContext::default();
/// let mut state = ModelStateDictionary::new();
/// let ctx = ModelBindingContext::top_level(&http, &mut state, ModelMetadata::for_type::<Person>(), "person");
///
/// assert!(ctx.is_top_level_object());
/// assert_eq!(ctx.error_key(), "");
/// ```
pub struct ModelBindingContext<'a> {
    http_context: &'a HttpContext,
    model_state: &'a mut ModelStateDictionary,
    metadata: ModelMetadata,
    model_name: String,
    field_name: String,
    binder_model_name: Option<String>,
    is_top_level_object: bool,
    binding_source: Option<BindingSource>,
    result: ModelBindingResult,
}

impl<'a> ModelBindingContext<'a> {
    /// Creates a context for the root model of an action.
    ///
    /// The field name defaults to the model name.
    pub fn top_level(
        http_context: &'a HttpContext,
        model_state: &'a mut ModelStateDictionary,
        metadata: ModelMetadata,
        model_name: impl Into<String>,
    ) -> Self {
        let model_name = model_name.into();
        let binding_source = metadata.binding_source();
        Self {
            http_context,
            model_state,
            metadata,
            field_name: model_name.clone(),
            model_name,
            binder_model_name: None,
            is_top_level_object: true,
            binding_source,
            result: ModelBindingResult::failed(),
        }
    }

    /// Creates a context for a nested property.
    pub fn nested(
        http_context: &'a HttpContext,
        model_state: &'a mut ModelStateDictionary,
        metadata: ModelMetadata,
        model_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            is_top_level_object: false,
            ..Self::top_level(http_context, model_state, metadata, model_name)
        }
    }

    /// Sets the field name.
    #[must_use]
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Sets an explicit binder model name.
    #[must_use]
    pub fn with_binder_model_name(mut self, name: impl Into<String>) -> Self {
        self.binder_model_name = Some(name.into());
        self
    }

    /// Sets the binding source.
    #[must_use]
    pub fn with_binding_source(mut self, source: BindingSource) -> Self {
        self.binding_source = Some(source);
        self
    }

    /// Returns the request context.
    #[must_use]
    pub const fn http_context(&self) -> &'a HttpContext {
        self.http_context
    }

    /// Returns the target model's metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Returns the model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the field name.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Returns the explicit binder model name, if set.
    #[must_use]
    pub fn binder_model_name(&self) -> Option<&str> {
        self.binder_model_name.as_deref()
    }

    /// Sets or clears the explicit binder model name.
    pub fn set_binder_model_name(&mut self, name: Option<String>) {
        self.binder_model_name = name;
    }

    /// Returns `true` if this binds the root model of an action.
    #[must_use]
    pub const fn is_top_level_object(&self) -> bool {
        self.is_top_level_object
    }

    /// Returns the binding source, if declared.
    #[must_use]
    pub const fn binding_source(&self) -> Option<BindingSource> {
        self.binding_source
    }

    /// Returns the key that binding errors are recorded under.
    ///
    /// Top-level bindings use the binder model name, or the empty string
    /// when none is set. Nested bindings use the model name.
    #[must_use]
    pub fn error_key(&self) -> String {
        if self.is_top_level_object {
            self.binder_model_name.clone().unwrap_or_default()
        } else {
            self.model_name.clone()
        }
    }

    /// Returns the shared model state.
    #[must_use]
    pub fn model_state(&self) -> &ModelStateDictionary {
        &*self.model_state
    }

    /// Returns the shared model state mutably.
    pub fn model_state_mut(&mut self) -> &mut ModelStateDictionary {
        &mut *self.model_state
    }

    /// Returns the binding result.
    #[must_use]
    pub const fn result(&self) -> &ModelBindingResult {
        &self.result
    }

    /// Replaces the binding result.
    pub fn set_result(&mut self, result: ModelBindingResult) {
        self.result = result;
    }

    /// Consumes the context, returning the result and releasing the model state.
    #[must_use]
    pub fn into_result(self) -> ModelBindingResult {
        self.result
    }
}

impl fmt::Debug for ModelBindingContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBindingContext")
            .field("request_id", &self.http_context.request_id())
            .field("model_name", &self.model_name)
            .field("field_name", &self.field_name)
            .field("binder_model_name", &self.binder_model_name)
            .field("is_top_level_object", &self.is_top_level_object)
            .field("binding_source", &self.binding_source)
            .field("metadata", &self.metadata)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Binds a model from some part of the request.
///
/// Implementations record recoverable failures in the context's model state
/// and return an error only for failures that must reach the host.
#[async_trait]
pub trait ModelBinder: Send + Sync {
    /// Attempts to bind the model described by `context`.
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> Result<(), BindingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person;

    #[test]
    fn test_result_success_and_downcast() {
        let result = ModelBindingResult::success(Some(Box::new(42_u32)));
        assert!(result.is_model_set());
        assert_eq!(result.model_as::<u32>(), Some(&42));
        assert!(result.model_as::<String>().is_none());
    }

    #[test]
    fn test_result_failed() {
        let result = ModelBindingResult::failed();
        assert!(!result.is_model_set());
        assert!(result.model().is_none());
    }

    #[test]
    fn test_error_key_top_level() {
        let http = HttpContext::default();
        let mut state = ModelStateDictionary::new();
        let ctx = ModelBindingContext::top_level(
            &http,
            &mut state,
            ModelMetadata::for_type::<Person>(),
            "someName",
        )
        .with_field_name("someField");

        assert_eq!(ctx.error_key(), "");
        assert_eq!(ctx.with_binder_model_name("custom").error_key(), "custom");
    }

    #[test]
    fn test_error_key_nested_uses_model_name() {
        let http = HttpContext::default();
        let mut state = ModelStateDictionary::new();
        let ctx = ModelBindingContext::nested(
            &http,
            &mut state,
            ModelMetadata::for_type::<Person>(),
            "order.customer",
            "customer",
        );

        assert!(!ctx.is_top_level_object());
        assert_eq!(ctx.field_name(), "customer");
        assert_eq!(ctx.error_key(), "order.customer");
    }

    #[test]
    fn test_binding_source_defaults_from_metadata() {
        let http = HttpContext::default();
        let mut state = ModelStateDictionary::new();
        let metadata = ModelMetadata::for_type::<Person>().with_binding_source(BindingSource::Body);
        let ctx = ModelBindingContext::top_level(&http, &mut state, metadata, "p");

        assert_eq!(ctx.binding_source(), Some(BindingSource::Body));
    }

    #[test]
    fn test_model_state_is_shared_with_caller() {
        let http = HttpContext::default();
        let mut state = ModelStateDictionary::new();
        let mut ctx = ModelBindingContext::top_level(
            &http,
            &mut state,
            ModelMetadata::for_type::<Person>(),
            "p",
        );
        ctx.model_state_mut().add_model_error("", "bad");
        let _ = ctx.into_result();

        assert_eq!(state.error_count(), 1);
    }
}
