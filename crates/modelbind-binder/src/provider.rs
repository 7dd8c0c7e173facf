//! Binder provider for body-sourced models.

use crate::binder::BodyModelBinder;
use crate::options::BodyBindingOptions;
use modelbind_core::{BindingSource, DiagnosticSink, ModelBinder, ModelMetadata};
use modelbind_formatters::FormatterCollection;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while composing binders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// A body binding was requested but no formatter is registered.
    #[error(
        "The input formatter collection must not be empty. At least one input formatter is required to bind from the body."
    )]
    NoInputFormatters,
}

/// Hands out the body binder for models bound from the request body.
///
/// The provider holds a single binder; every call that matches returns a
/// shared handle to it.
#[derive(Debug, Clone)]
pub struct BodyModelBinderProvider {
    binder: Arc<BodyModelBinder>,
}

impl BodyModelBinderProvider {
    /// Creates a provider.
    #[must_use]
    pub fn new(formatters: FormatterCollection, options: BodyBindingOptions) -> Self {
        Self::from_binder(BodyModelBinder::new(formatters).with_options(options))
    }

    /// Creates a provider with a custom diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(
        formatters: FormatterCollection,
        options: BodyBindingOptions,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self::from_binder(
            BodyModelBinder::new(formatters)
                .with_options(options)
                .with_diagnostics(diagnostics),
        )
    }

    /// Wraps an already configured binder.
    #[must_use]
    pub fn from_binder(binder: BodyModelBinder) -> Self {
        Self {
            binder: Arc::new(binder),
        }
    }

    /// Returns the body binder for `metadata`, or `None` if the model is not
    /// bound from the body.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoInputFormatters`] for a body-sourced model
    /// when no formatters are registered.
    pub fn get_binder(
        &self,
        metadata: &ModelMetadata,
    ) -> Result<Option<Arc<dyn ModelBinder>>, ProviderError> {
        if metadata.binding_source() != Some(BindingSource::Body) {
            return Ok(None);
        }

        if self.binder.formatters().is_empty() {
            return Err(ProviderError::NoInputFormatters);
        }

        let binder: Arc<dyn ModelBinder> = self.binder.clone();
        Ok(Some(binder))
    }

    /// Returns the shared body binder.
    #[must_use]
    pub fn binder(&self) -> &Arc<BodyModelBinder> {
        &self.binder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelbind_formatters::{InputFormatterResult, TextInputFormatter};

    struct Person;

    fn plain_text() -> FormatterCollection {
        FormatterCollection::new().with(
            TextInputFormatter::from_fn(|_ctx, text| Ok(InputFormatterResult::success(text)))
                .with_media_type("text/plain")
                .unwrap(),
        )
    }

    #[test]
    fn test_returns_binder_for_body_source() {
        let provider = BodyModelBinderProvider::new(plain_text(), BodyBindingOptions::default());
        let metadata = ModelMetadata::for_type::<Person>().with_binding_source(BindingSource::Body);

        assert!(provider.get_binder(&metadata).unwrap().is_some());
    }

    #[test]
    fn test_ignores_other_sources() {
        let provider = BodyModelBinderProvider::new(plain_text(), BodyBindingOptions::default());

        for source in [BindingSource::Form, BindingSource::Query, BindingSource::Header] {
            let metadata = ModelMetadata::for_type::<Person>().with_binding_source(source);
            assert!(provider.get_binder(&metadata).unwrap().is_none());
        }

        let undeclared = ModelMetadata::for_type::<Person>();
        assert!(provider.get_binder(&undeclared).unwrap().is_none());
    }

    #[test]
    fn test_empty_formatters_is_an_error_for_body() {
        let provider =
            BodyModelBinderProvider::new(FormatterCollection::new(), BodyBindingOptions::default());
        let body = ModelMetadata::for_type::<Person>().with_binding_source(BindingSource::Body);
        let query = ModelMetadata::for_type::<Person>().with_binding_source(BindingSource::Query);

        assert_eq!(
            provider.get_binder(&body).err(),
            Some(ProviderError::NoInputFormatters)
        );
        assert!(provider.get_binder(&query).unwrap().is_none());
    }

    #[test]
    fn test_binder_is_shared() {
        let provider = BodyModelBinderProvider::new(plain_text(), BodyBindingOptions::default());
        let metadata = ModelMetadata::for_type::<Person>().with_binding_source(BindingSource::Body);

        let first = provider.get_binder(&metadata).unwrap().unwrap();
        let second = provider.get_binder(&metadata).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
