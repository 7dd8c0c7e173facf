//! Configuration, body binding and form limits wired together.

use async_trait::async_trait;
use modelbind::prelude::*;
use modelbind::core::RecordingDiagnostics;
use modelbind::formatters::InputFormatError;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, PartialEq, Deserialize)]
struct Order {
    id: u32,
    sku: String,
}

struct JsonFormatter;

#[async_trait]
impl InputFormatter for JsonFormatter {
    fn name(&self) -> &str {
        "JsonFormatter"
    }

    fn can_read(&self, context: &InputFormatterContext<'_>) -> bool {
        context
            .media_type()
            .is_some_and(|media_type| media_type.essence_str() == "application/json")
    }

    async fn read(
        &self,
        context: &InputFormatterContext<'_>,
    ) -> Result<InputFormatterResult, ReadError> {
        let bytes = context.body().read_to_end().await?;
        if bytes.is_empty() {
            return Ok(if context.treat_empty_input_as_default_value() {
                InputFormatterResult::success_default(context.metadata())
            } else {
                InputFormatterResult::no_value()
            });
        }

        let order: Order = serde_json::from_slice(&bytes).map_err(|err| {
            InputFormatError::with_source("The JSON value could not be converted.", err)
        })?;
        Ok(InputFormatterResult::success(order))
    }
}

fn json_request(body: &'static str) -> HttpContext {
    HttpContext::builder()
        .content_type("application/json; charset=utf-8")
        .body(body)
        .build()
}

#[tokio::test]
async fn test_binds_json_order() {
    let binding = ModelBinding::builder().formatter(JsonFormatter).build();

    let bound = binding
        .bind_body::<Order>(&json_request(r#"{"id": 7, "sku": "A-1"}"#), "order")
        .await
        .unwrap();

    assert_eq!(
        bound.model(),
        Some(&Order {
            id: 7,
            sku: "A-1".to_string()
        })
    );
    assert!(bound.is_valid());
}

#[tokio::test]
async fn test_malformed_json_is_a_model_error_under_empty_key() {
    let binding = ModelBinding::builder().formatter(JsonFormatter).build();

    let bound = binding
        .bind_body::<Order>(&json_request(r#"{"id": "seven"}"#), "order")
        .await
        .unwrap();

    assert!(bound.model().is_none());
    let (_, state) = bound.into_parts();
    let entry = state.get("").unwrap();
    assert_eq!(entry.errors().len(), 1);
    assert!(entry.errors()[0].exception().is_some());
}

#[tokio::test]
async fn test_empty_body_follows_configured_flag() {
    let strict = ModelBinding::builder().formatter(JsonFormatter).build();
    let bound = strict.bind_body::<Order>(&json_request(""), "order").await.unwrap();
    assert!(!bound.is_model_set());
    assert_eq!(
        bound.model_state().get("").unwrap().errors()[0].error_message(),
        "A non-empty request body is required."
    );

    let config = ConfigLoader::new()
        .with_string("[binding]\nallow_empty_input_in_body_binding = true", "toml")
        .unwrap()
        .load()
        .unwrap();
    let lenient = ModelBinding::builder()
        .from_config(&config)
        .formatter(JsonFormatter)
        .build();
    let bound = lenient.bind_body::<Order>(&json_request(""), "order").await.unwrap();
    assert!(bound.is_model_set());
    assert!(bound.is_valid());
}

#[tokio::test]
async fn test_unsupported_content_type_emits_diagnostics() {
    let sink = Arc::new(RecordingDiagnostics::new());
    let binding = ModelBinding::builder()
        .formatter(JsonFormatter)
        .diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticSink>)
        .build();
    let http = HttpContext::builder()
        .content_type("text/csv")
        .body("7,A-1")
        .build();

    let bound = binding.bind_body::<Order>(&http, "order").await.unwrap();

    assert_eq!(
        bound.model_state().get("").unwrap().errors()[0].error_message(),
        "Unsupported content type 'text/csv'."
    );
    let events = sink.events();
    assert!(matches!(events.first(), Some(DiagnosticEvent::RejectedInputFormatter { .. })));
    assert!(matches!(events.last(), Some(DiagnosticEvent::RemoveFromBodyAdvice { .. })));
}

#[tokio::test]
async fn test_action_limits_override_configured_defaults() {
    let config = ConfigLoader::new()
        .with_string("[form_limits]\nvalue_count_limit = 100", "toml")
        .unwrap()
        .load()
        .unwrap();
    let binding = ModelBinding::builder().from_config(&config).build();

    let mut policies = binding.form_limits_policies(FilterScope::Global);
    policies.register(
        RequestFormLimits::new().value_count_limit(1).build_filter(),
        FilterScope::Action,
    );

    let mut http = HttpContext::builder()
        .content_type("application/x-www-form-urlencoded")
        .body("a=1&b=2")
        .build();
    policies.apply(&mut http).unwrap();

    assert!(read_form(&mut http).await.is_err());
}

#[tokio::test]
async fn test_configured_defaults_govern_form_read() {
    let binding = ModelBinding::builder()
        .form_limits(FormOptions {
            value_count_limit: 5,
            ..FormOptions::default()
        })
        .build();

    let mut http = HttpContext::builder()
        .content_type("application/x-www-form-urlencoded")
        .body("a=1&b=2")
        .build();
    binding
        .form_limits_policies(FilterScope::Global)
        .apply(&mut http)
        .unwrap();

    let form = read_form(&mut http).await.unwrap();
    assert_eq!(form.get("b"), Some("2"));
    assert_eq!(
        http.features().get::<FormFeature>().unwrap().options().value_count_limit,
        5
    );
}
