//! End-to-end body binding behavior.

use async_trait::async_trait;
use modelbind_binder::{BodyBindingOptions, BodyModelBinder};
use modelbind_core::{
    BindingError, DiagnosticEvent, DiagnosticSink, HttpContext, ModelBinder, ModelBindingContext,
    ModelBindingMessageProvider, ModelMetadata, ModelStateDictionary, RecordingDiagnostics,
    UnsupportedContentTypeError,
};
use modelbind_formatters::{
    FormatterCollection, InputFormatError, InputFormatter, InputFormatterContext,
    InputFormatterResult, ReadError, TextInputFormatter,
};
use proptest::prelude::*;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default, PartialEq)]
struct Person {
    name: String,
}

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    NoValue,
    FormatError,
    IoError,
}

struct TestFormatter {
    name: &'static str,
    can_read: bool,
    behavior: Behavior,
    send_bad_request: bool,
}

impl TestFormatter {
    fn new(name: &'static str, can_read: bool, behavior: Behavior) -> Self {
        Self {
            name,
            can_read,
            behavior,
            send_bad_request: false,
        }
    }

    fn reading(behavior: Behavior) -> Self {
        Self::new("TestFormatter", true, behavior)
    }

    fn with_send_bad_request(mut self) -> Self {
        self.send_bad_request = true;
        self
    }
}

#[async_trait]
impl InputFormatter for TestFormatter {
    fn name(&self) -> &str {
        self.name
    }

    fn can_read(&self, _context: &InputFormatterContext<'_>) -> bool {
        self.can_read
    }

    async fn read(
        &self,
        _context: &InputFormatterContext<'_>,
    ) -> Result<InputFormatterResult, ReadError> {
        match self.behavior {
            Behavior::Succeed => Ok(InputFormatterResult::success(Person {
                name: self.name.to_string(),
            })),
            Behavior::NoValue => Ok(InputFormatterResult::no_value()),
            Behavior::FormatError => Err(InputFormatError::with_source(
                "Bad input!!",
                io::Error::new(io::ErrorKind::InvalidData, "Bad data!"),
            )
            .into()),
            Behavior::IoError => Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "Unable to read input stream!!",
            )
            .into()),
        }
    }

    fn send_bad_request_for_exceptions_during_deserialization(&self) -> bool {
        self.send_bad_request
    }
}

struct Harness {
    binder: BodyModelBinder,
    sink: Arc<RecordingDiagnostics>,
}

fn harness(formatters: FormatterCollection, options: BodyBindingOptions) -> Harness {
    let sink = Arc::new(RecordingDiagnostics::new());
    let binder = BodyModelBinder::new(formatters)
        .with_options(options)
        .with_diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticSink>);
    Harness { binder, sink }
}

fn json_request() -> HttpContext {
    HttpContext::builder()
        .content_type("application/json")
        .body(r#"{"name":"Ada"}"#)
        .build()
}

fn top_level<'a>(
    http: &'a HttpContext,
    state: &'a mut ModelStateDictionary,
) -> ModelBindingContext<'a> {
    ModelBindingContext::top_level(http, state, ModelMetadata::for_type::<Person>(), "someName")
        .with_field_name("someField")
}

fn single_error(state: &ModelStateDictionary) -> (&str, &modelbind_core::ModelError) {
    assert_eq!(state.error_count(), 1, "expected exactly one error");
    let (key, entry) = state.iter().next().unwrap();
    assert_eq!(entry.errors().len(), 1);
    (key, &entry.errors()[0])
}

#[tokio::test]
async fn test_selects_first_accepting_formatter_in_order() {
    let formatters = FormatterCollection::new()
        .with(TestFormatter::new("F1", false, Behavior::Succeed))
        .with(TestFormatter::new("F2", false, Behavior::Succeed))
        .with(TestFormatter::new("F3", true, Behavior::Succeed))
        .with(TestFormatter::new("F4", true, Behavior::Succeed));
    let Harness { binder, sink } = harness(formatters, BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    let result = ctx.into_result();
    assert!(result.is_model_set());
    assert_eq!(
        result.model_as::<Person>(),
        Some(&Person {
            name: "F3".to_string()
        })
    );
    assert_eq!(
        sink.messages(),
        vec![
            "Rejected input formatter 'F1' for content type 'application/json'.",
            "Rejected input formatter 'F2' for content type 'application/json'.",
            "Selected input formatter 'F3' for content type 'application/json'.",
        ]
    );
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_no_formatter_records_unsupported_content_type_under_empty_key() {
    let Harness { binder, sink } =
        harness(FormatterCollection::new(), BodyBindingOptions::default());

    let http = HttpContext::builder().content_type("text/xyz").build();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    let result = ctx.into_result();
    assert!(!result.is_model_set());
    assert!(result.model().is_none());

    let (key, error) = single_error(&state);
    assert_eq!(key, "");
    assert_eq!(error.error_message(), "Unsupported content type 'text/xyz'.");
    assert!(error
        .exception()
        .unwrap()
        .downcast_ref::<UnsupportedContentTypeError>()
        .is_some());

    assert_eq!(
        sink.messages(),
        vec![
            "No input formatter was found to support the content type 'text/xyz' for use with the [FromBody] attribute.".to_string(),
            format!(
                "To use model binding, remove the [FromBody] attribute from the property or parameter named 'someName' with model type '{}'.",
                std::any::type_name::<Person>()
            ),
        ]
    );
}

#[tokio::test]
async fn test_no_formatter_when_none_accept() {
    let formatters = FormatterCollection::new()
        .with(TestFormatter::new("F1", false, Behavior::Succeed))
        .with(TestFormatter::new("F2", false, Behavior::Succeed));
    let Harness { binder, sink } = harness(formatters, BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    assert!(!ctx.result().is_model_set());
    let (key, error) = single_error(&state);
    assert_eq!(key, "");
    assert_eq!(
        error.error_message(),
        "Unsupported content type 'application/json'."
    );

    let events = sink.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events[2],
        DiagnosticEvent::NoInputFormatterFound { .. }
    ));
    assert!(matches!(
        events[3],
        DiagnosticEvent::RemoveFromBodyAdvice { .. }
    ));
}

#[tokio::test]
async fn test_missing_content_type_reported_as_empty() {
    let Harness { binder, .. } =
        harness(FormatterCollection::new(), BodyBindingOptions::default());

    let http = HttpContext::default();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    let (_, error) = single_error(&state);
    assert_eq!(error.error_message(), "Unsupported content type ''.");
}

#[tokio::test]
async fn test_missing_content_type_still_selects_by_type() {
    let formatters =
        FormatterCollection::new().with(TestFormatter::new("ByType", true, Behavior::Succeed));
    let Harness { binder, sink } = harness(formatters, BodyBindingOptions::default());

    let http = HttpContext::default();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    assert!(ctx.result().is_model_set());
    assert_eq!(
        sink.messages(),
        vec!["Selected input formatter 'ByType' for content type ''."]
    );
}

#[tokio::test]
async fn test_explicit_binder_model_name_keys_errors() {
    let Harness { binder, .. } =
        harness(FormatterCollection::new(), BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state).with_binder_model_name("custom");
    binder.bind_model(&mut ctx).await.unwrap();

    let (key, _) = single_error(&state);
    assert_eq!(key, "custom");
}

#[tokio::test]
async fn test_nested_binding_keys_errors_by_model_name() {
    let formatters = FormatterCollection::new().with(TestFormatter::reading(Behavior::NoValue));
    let Harness { binder, .. } = harness(formatters, BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = ModelBindingContext::nested(
        &http,
        &mut state,
        ModelMetadata::for_type::<Person>(),
        "order.customer",
        "customer",
    );
    binder.bind_model(&mut ctx).await.unwrap();

    let (key, _) = single_error(&state);
    assert_eq!(key, "order.customer");
}

#[tokio::test]
async fn test_success_sets_model_without_errors() {
    let formatters = FormatterCollection::new().with(TestFormatter::reading(Behavior::Succeed));
    let Harness { binder, .. } = harness(formatters, BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    let result = ctx.into_result();
    assert!(result.is_model_set());
    assert_eq!(
        result.model_as::<Person>().map(|p| p.name.as_str()),
        Some("TestFormatter")
    );
    assert_eq!(state.error_count(), 0);
}

#[tokio::test]
async fn test_no_value_records_default_missing_body_message() {
    let formatters = FormatterCollection::new().with(TestFormatter::reading(Behavior::NoValue));
    let Harness { binder, .. } = harness(formatters, BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    let result = ctx.into_result();
    assert!(!result.is_model_set());
    assert!(result.model().is_none());

    let (key, error) = single_error(&state);
    assert_eq!(key, "");
    assert_eq!(error.error_message(), "A non-empty request body is required.");
    assert!(error.exception().is_none());
}

#[tokio::test]
async fn test_no_value_uses_custom_message_accessor() {
    let formatters = FormatterCollection::new().with(TestFormatter::reading(Behavior::NoValue));
    let Harness { binder, .. } = harness(formatters, BodyBindingOptions::default());

    let mut provider = ModelBindingMessageProvider::default();
    provider.set_missing_request_body_required_value_accessor(|| {
        "Customized error message".to_string()
    });
    let metadata = ModelMetadata::for_type::<Person>().with_message_provider(provider);

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = ModelBindingContext::top_level(&http, &mut state, metadata, "someName")
        .with_binder_model_name("custom");
    binder.bind_model(&mut ctx).await.unwrap();

    let (key, error) = single_error(&state);
    assert_eq!(key, "custom");
    assert_eq!(error.error_message(), "Customized error message");
}

#[tokio::test]
async fn test_format_error_is_recorded_with_original_error() {
    for send_all in [false, true] {
        let formatters =
            FormatterCollection::new().with(TestFormatter::reading(Behavior::FormatError));
        let options =
            BodyBindingOptions::default().with_send_bad_request_for_all_exceptions(send_all);
        let Harness { binder, .. } = harness(formatters, options);

        let http = json_request();
        let mut state = ModelStateDictionary::new();
        let mut ctx = top_level(&http, &mut state);
        binder.bind_model(&mut ctx).await.unwrap();

        assert!(!ctx.result().is_model_set());
        let (key, error) = single_error(&state);
        assert_eq!(key, "");
        assert_eq!(error.error_message(), "Bad input!!");

        let original = error
            .exception()
            .unwrap()
            .downcast_ref::<InputFormatError>()
            .unwrap();
        assert_eq!(original.message(), "Bad input!!");
        assert_eq!(original.cause().unwrap().to_string(), "Bad data!");
    }
}

#[tokio::test]
async fn test_other_error_propagates_unchanged_by_default() {
    let formatters = FormatterCollection::new().with(TestFormatter::reading(Behavior::IoError));
    let Harness { binder, .. } = harness(formatters, BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    let err = binder.bind_model(&mut ctx).await.unwrap_err();

    assert!(!ctx.result().is_model_set());
    drop(ctx);
    assert_eq!(state.error_count(), 0);

    assert!(matches!(err, BindingError::Unhandled(_)));
    assert_eq!(err.to_string(), "Unable to read input stream!!");
    let io = err.into_unhandled().unwrap().downcast::<io::Error>().unwrap();
    assert_eq!(io.kind(), io::ErrorKind::ConnectionAborted);
}

#[tokio::test]
async fn test_other_error_converted_by_global_flag() {
    let formatters = FormatterCollection::new().with(TestFormatter::reading(Behavior::IoError));
    let options = BodyBindingOptions::default().with_send_bad_request_for_all_exceptions(true);
    let Harness { binder, .. } = harness(formatters, options);

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    assert!(!ctx.result().is_model_set());
    let (key, error) = single_error(&state);
    assert_eq!(key, "");
    assert_eq!(error.error_message(), "Unable to read input stream!!");
    assert!(error.exception().unwrap().downcast_ref::<io::Error>().is_some());
}

#[tokio::test]
async fn test_other_error_converted_by_formatter_override() {
    let formatters = FormatterCollection::new()
        .with(TestFormatter::reading(Behavior::IoError).with_send_bad_request());
    let Harness { binder, .. } = harness(formatters, BodyBindingOptions::default());

    let http = json_request();
    let mut state = ModelStateDictionary::new();
    let mut ctx = top_level(&http, &mut state);
    binder.bind_model(&mut ctx).await.unwrap();

    let (_, error) = single_error(&state);
    assert_eq!(error.error_message(), "Unable to read input stream!!");
}

#[tokio::test]
async fn test_empty_body_binds_default_when_allowed() {
    let text = TextInputFormatter::from_fn(|_ctx, text| {
        Ok(InputFormatterResult::success(Person { name: text }))
    })
    .with_media_type("text/plain")
    .unwrap();
    let formatters = FormatterCollection::new().with(text);
    let options = BodyBindingOptions::default().with_allow_empty_input(true);
    let Harness { binder, .. } = harness(formatters, options);

    let http = HttpContext::builder()
        .content_type("text/plain")
        .header("content-length", "0")
        .build();
    let mut state = ModelStateDictionary::new();
    let metadata = ModelMetadata::for_default::<Person>();
    let mut ctx = ModelBindingContext::top_level(&http, &mut state, metadata, "someName");
    binder.bind_model(&mut ctx).await.unwrap();

    let result = ctx.into_result();
    assert!(result.is_model_set());
    assert_eq!(result.model_as::<Person>(), Some(&Person::default()));
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_empty_body_without_flag_reports_missing_body() {
    let text = TextInputFormatter::from_fn(|_ctx, text| {
        Ok(InputFormatterResult::success(Person { name: text }))
    })
    .with_media_type("text/plain")
    .unwrap();
    let Harness { binder, .. } = harness(
        FormatterCollection::new().with(text),
        BodyBindingOptions::default(),
    );

    let http = HttpContext::builder().content_type("text/plain").build();
    let mut state = ModelStateDictionary::new();
    let metadata = ModelMetadata::for_default::<Person>();
    let mut ctx = ModelBindingContext::top_level(&http, &mut state, metadata, "someName");
    binder.bind_model(&mut ctx).await.unwrap();

    assert!(!ctx.result().is_model_set());
    let (_, error) = single_error(&state);
    assert_eq!(error.error_message(), "A non-empty request body is required.");
}

proptest! {
    #[test]
    fn test_other_error_converts_iff_global_or_override(global in any::<bool>(), per_formatter in any::<bool>()) {
        let formatter = TestFormatter {
            send_bad_request: per_formatter,
            ..TestFormatter::reading(Behavior::IoError)
        };
        let options = BodyBindingOptions::default().with_send_bad_request_for_all_exceptions(global);
        let Harness { binder, .. } = harness(FormatterCollection::new().with(formatter), options);

        let http = json_request();
        let mut state = ModelStateDictionary::new();
        let mut ctx = top_level(&http, &mut state);
        let outcome = tokio_test::block_on(binder.bind_model(&mut ctx));
        drop(ctx);

        if global || per_formatter {
            prop_assert!(outcome.is_ok());
            prop_assert_eq!(state.error_count(), 1);
        } else {
            prop_assert!(outcome.is_err());
            prop_assert_eq!(state.error_count(), 0);
        }
    }
}
