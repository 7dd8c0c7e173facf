//! The body model binder.

use crate::options::BodyBindingOptions;
use async_trait::async_trait;
use modelbind_core::{
    BindingError, DiagnosticEvent, DiagnosticSink, ModelBinder, ModelBindingContext,
    ModelBindingResult, TracingDiagnostics, UnsupportedContentTypeError,
};
use modelbind_formatters::{FormatterCollection, InputFormatterContext, InputFormatterResult};
use modelbind_telemetry::metrics::NO_FORMATTER_LABEL;
use modelbind_telemetry::{record_body_binding, record_formatter_read, BindingOutcome};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Binds a model from the request body using the registered formatters.
///
/// The binder never fails for problems with the client's input. A missing
/// formatter, an empty body and a malformed body are all recorded in model
/// state under the context's error key. Only formatter failures that are not
/// format errors, and that no policy converts, are returned as
/// [`BindingError::Unhandled`].
///
/// # Example
///
/// ```rust
/// use modelbind_binder::BodyModelBinder;
/// use modelbind_core::{HttpContext, ModelBinder, ModelBindingContext, ModelMetadata, ModelStateDictionary};
/// use modelbind_formatters::{FormatterCollection, InputFormatterResult, TextInputFormatter};
///
/// # tokio_test::block_on(async {
/// let formatters = FormatterCollection::new().with(
///     TextInputFormatter::from_fn(|_ctx, text| Ok(InputFormatterResult::success(text)))
///         .with_media_type("text/plain")
///         .unwrap(),
/// );
/// let binder = BodyModelBinder::new(formatters);
///
/// let http = HttpContext::builder().content_type("text/plain").body("hello").build();
/// let mut state = ModelStateDictionary::new();
/// let mut ctx = ModelBindingContext::top_level(&http, &mut state, ModelMetadata::for_type::<String>(), "message");
///
/// binder.bind_model(&mut ctx).await.unwrap();
/// assert_eq!(ctx.result().model_as::<String>().map(String::as_str), Some("hello"));
/// # });
/// ```
#[derive(Clone)]
pub struct BodyModelBinder {
    formatters: FormatterCollection,
    options: BodyBindingOptions,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl BodyModelBinder {
    /// Creates a binder with default options that logs diagnostics through `tracing`.
    #[must_use]
    pub fn new(formatters: FormatterCollection) -> Self {
        Self {
            formatters,
            options: BodyBindingOptions::default(),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Sets the binder options.
    #[must_use]
    pub const fn with_options(mut self, options: BodyBindingOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the registered formatters.
    #[must_use]
    pub const fn formatters(&self) -> &FormatterCollection {
        &self.formatters
    }

    /// Returns the binder options.
    #[must_use]
    pub const fn options(&self) -> &BodyBindingOptions {
        &self.options
    }
}

impl fmt::Debug for BodyModelBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyModelBinder")
            .field("formatters", &self.formatters)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelBinder for BodyModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> Result<(), BindingError> {
        let http = context.http_context();
        let model_name = context.model_name().to_string();
        let metadata = context.metadata().clone();
        let key = context.error_key();

        let formatter_context = InputFormatterContext::new(
            http,
            &model_name,
            &metadata,
            self.options.allow_empty_input_in_body_binding,
        );

        let Some(formatter) = self
            .formatters
            .select(&formatter_context, self.diagnostics.as_ref())
        else {
            self.diagnostics.emit(DiagnosticEvent::RemoveFromBodyAdvice {
                model_name: model_name.clone(),
                model_type: metadata.type_name().to_string(),
            });

            let content_type = http.content_type().unwrap_or_default();
            context
                .model_state_mut()
                .add_model_exception(key, Arc::new(UnsupportedContentTypeError::new(content_type)));
            record_body_binding(BindingOutcome::NoFormatter, NO_FORMATTER_LABEL);
            return Ok(());
        };

        let formatter_name = formatter.name().to_string();
        let span = tracing::debug_span!(
            "read_body",
            request_id = %http.request_id(),
            model_name = %model_name,
            formatter = %formatter_name,
        );

        let started = Instant::now();
        let outcome = formatter.read(&formatter_context).instrument(span).await;
        record_formatter_read(&formatter_name, started.elapsed());

        let binding_outcome = match outcome {
            Ok(InputFormatterResult::Success(model)) => {
                context.set_result(ModelBindingResult::success(model));
                BindingOutcome::Bound
            }
            Ok(InputFormatterResult::NoValue) => {
                context.set_result(ModelBindingResult::failed());
                let message = metadata
                    .message_provider()
                    .missing_request_body_required_value();
                context.model_state_mut().add_model_error(key, message);
                BindingOutcome::NoValue
            }
            Err(err) if err.is_format_error() => {
                context.model_state_mut().add_boxed_exception(key, err.into_boxed());
                BindingOutcome::FormatError
            }
            Err(err)
                if self.options.send_bad_request_for_all_formatter_exceptions
                    || formatter.send_bad_request_for_exceptions_during_deserialization() =>
            {
                context.model_state_mut().add_boxed_exception(key, err.into_boxed());
                BindingOutcome::ConvertedException
            }
            Err(err) => {
                modelbind_telemetry::log_unhandled_formatter_error!(
                    http.request_id(),
                    &formatter_name,
                    &err
                );
                record_body_binding(BindingOutcome::UnhandledException, &formatter_name);
                return Err(BindingError::Unhandled(err.into_boxed()));
            }
        };

        record_body_binding(binding_outcome, &formatter_name);
        Ok(())
    }
}
