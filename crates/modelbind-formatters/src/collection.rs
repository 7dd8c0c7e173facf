//! Formatter registry and selection.

use crate::context::InputFormatterContext;
use crate::formatter::InputFormatter;
use modelbind_core::{DiagnosticEvent, DiagnosticSink};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
struct Registration {
    type_id: TypeId,
    formatter: Arc<dyn InputFormatter>,
}

/// Ordered collection of input formatters.
///
/// Selection always walks the formatters in registration order, so a later
/// formatter never overrides an earlier one that accepts the request.
///
/// # Example
///
/// ```rust
/// use modelbind_formatters::{FormatterCollection, TextInputFormatter, InputFormatterResult};
///
/// let plain = TextInputFormatter::from_fn(|_ctx, text| Ok(InputFormatterResult::success(text)))
///     .with_media_type("text/plain")
///     .unwrap();
///
/// let formatters = FormatterCollection::new().with(plain);
/// assert_eq!(formatters.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct FormatterCollection {
    formatters: Vec<Registration>,
}

impl FormatterCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a formatter.
    pub fn push<F: InputFormatter>(&mut self, formatter: F) {
        self.push_shared(Arc::new(formatter));
    }

    /// Appends a formatter that is also held elsewhere.
    pub fn push_shared<F: InputFormatter>(&mut self, formatter: Arc<F>) {
        self.formatters.push(Registration {
            type_id: TypeId::of::<F>(),
            formatter,
        });
    }

    /// Inserts a formatter at `index`, shifting later ones back.
    ///
    /// Indices past the end append.
    pub fn insert<F: InputFormatter>(&mut self, index: usize, formatter: F) {
        let index = index.min(self.formatters.len());
        self.formatters.insert(
            index,
            Registration {
                type_id: TypeId::of::<F>(),
                formatter: Arc::new(formatter),
            },
        );
    }

    /// Appends a formatter, builder style.
    #[must_use]
    pub fn with<F: InputFormatter>(mut self, formatter: F) -> Self {
        self.push(formatter);
        self
    }

    /// Removes every formatter of type `F`.
    pub fn remove_type<F: InputFormatter>(&mut self) {
        let type_id = TypeId::of::<F>();
        self.formatters.retain(|registration| registration.type_id != type_id);
    }

    /// Returns `true` if a formatter of type `F` is registered.
    #[must_use]
    pub fn contains_type<F: InputFormatter>(&self) -> bool {
        let type_id = TypeId::of::<F>();
        self.formatters
            .iter()
            .any(|registration| registration.type_id == type_id)
    }

    /// Returns the number of formatters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    /// Returns `true` if no formatters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }

    /// Iterates formatters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn InputFormatter>> {
        self.formatters.iter().map(|registration| &registration.formatter)
    }

    /// Picks the first formatter that can read the request.
    ///
    /// A rejection is reported for every formatter skipped before the chosen
    /// one, followed by the selection. If nothing accepts, a single
    /// "no formatter found" event is reported and `None` is returned.
    pub fn select(
        &self,
        context: &InputFormatterContext<'_>,
        diagnostics: &dyn DiagnosticSink,
    ) -> Option<&Arc<dyn InputFormatter>> {
        let content_type = context.content_type().unwrap_or_default();

        for formatter in self.iter() {
            if formatter.can_read(context) {
                diagnostics.emit(DiagnosticEvent::SelectedInputFormatter {
                    formatter: formatter.name().to_string(),
                    content_type: content_type.to_string(),
                });
                return Some(formatter);
            }

            diagnostics.emit(DiagnosticEvent::RejectedInputFormatter {
                formatter: formatter.name().to_string(),
                content_type: content_type.to_string(),
            });
        }

        diagnostics.emit(DiagnosticEvent::NoInputFormatterFound {
            content_type: content_type.to_string(),
            model_name: context.model_name().to_string(),
        });
        None
    }
}

impl fmt::Debug for FormatterCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.formatters.iter().map(|registration| registration.formatter.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use crate::formatter::InputFormatterResult;
    use async_trait::async_trait;
    use modelbind_core::{HttpContext, ModelMetadata, RecordingDiagnostics};
    use proptest::prelude::*;

    struct Person;

    struct Fixed {
        name: String,
        can_read: bool,
    }

    impl Fixed {
        fn new(name: &str, can_read: bool) -> Self {
            Self {
                name: name.to_string(),
                can_read,
            }
        }
    }

    #[async_trait]
    impl InputFormatter for Fixed {
        fn name(&self) -> &str {
            &self.name
        }

        fn can_read(&self, _context: &InputFormatterContext<'_>) -> bool {
            self.can_read
        }

        async fn read(
            &self,
            _context: &InputFormatterContext<'_>,
        ) -> Result<InputFormatterResult, ReadError> {
            Ok(InputFormatterResult::success(self.name.clone()))
        }
    }

    struct Other;

    #[async_trait]
    impl InputFormatter for Other {
        fn can_read(&self, _context: &InputFormatterContext<'_>) -> bool {
            false
        }

        async fn read(
            &self,
            _context: &InputFormatterContext<'_>,
        ) -> Result<InputFormatterResult, ReadError> {
            Ok(InputFormatterResult::no_value())
        }
    }

    fn json_context() -> HttpContext {
        HttpContext::builder().content_type("application/json").build()
    }

    #[test]
    fn test_selects_first_accepting_in_order() {
        let formatters = FormatterCollection::new()
            .with(Fixed::new("F1", false))
            .with(Fixed::new("F2", false))
            .with(Fixed::new("F3", true))
            .with(Fixed::new("F4", true));
        let http = json_context();
        let metadata = ModelMetadata::for_type::<Person>();
        let ctx = InputFormatterContext::new(&http, "someName", &metadata, false);
        let sink = RecordingDiagnostics::new();

        let selected = formatters.select(&ctx, &sink).unwrap();

        assert_eq!(selected.name(), "F3");
        assert_eq!(
            sink.messages(),
            vec![
                "Rejected input formatter 'F1' for content type 'application/json'.",
                "Rejected input formatter 'F2' for content type 'application/json'.",
                "Selected input formatter 'F3' for content type 'application/json'.",
            ]
        );
    }

    #[test]
    fn test_empty_collection_reports_no_formatter() {
        let http = HttpContext::builder().content_type("text/xyz").build();
        let metadata = ModelMetadata::for_type::<Person>();
        let ctx = InputFormatterContext::new(&http, "someName", &metadata, false);
        let sink = RecordingDiagnostics::new();

        assert!(FormatterCollection::new().select(&ctx, &sink).is_none());
        assert_eq!(
            sink.events(),
            vec![DiagnosticEvent::NoInputFormatterFound {
                content_type: "text/xyz".to_string(),
                model_name: "someName".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_content_type_reported_as_empty() {
        let http = HttpContext::default();
        let metadata = ModelMetadata::for_type::<Person>();
        let ctx = InputFormatterContext::new(&http, "p", &metadata, false);
        let sink = RecordingDiagnostics::new();

        let formatters = FormatterCollection::new().with(Fixed::new("Any", true));
        assert!(formatters.select(&ctx, &sink).is_some());
        assert_eq!(
            sink.messages(),
            vec!["Selected input formatter 'Any' for content type ''."]
        );
    }

    #[test]
    fn test_type_registry_operations() {
        let mut formatters = FormatterCollection::new().with(Other).with(Fixed::new("A", true));
        formatters.insert(0, Fixed::new("B", true));
        assert_eq!(formatters.len(), 3);
        assert_eq!(formatters.iter().next().unwrap().name(), "B");
        assert!(formatters.contains_type::<Other>());

        formatters.remove_type::<Fixed>();
        assert_eq!(formatters.len(), 1);
        assert!(!formatters.contains_type::<Fixed>());
    }

    #[test]
    fn test_push_shared_keeps_identity() {
        let shared = Arc::new(Fixed::new("shared", true));
        let mut formatters = FormatterCollection::new();
        formatters.push_shared(Arc::clone(&shared));

        let http = json_context();
        let metadata = ModelMetadata::for_type::<Person>();
        let ctx = InputFormatterContext::new(&http, "p", &metadata, false);
        let selected = formatters.select(&ctx, &RecordingDiagnostics::new()).unwrap();

        let selected_ptr = Arc::as_ptr(selected).cast::<()>();
        assert_eq!(selected_ptr, Arc::as_ptr(&shared).cast::<()>());
    }

    proptest! {
        #[test]
        fn prop_selection_is_first_acceptor(accepts in proptest::collection::vec(any::<bool>(), 0..12)) {
            let mut formatters = FormatterCollection::new();
            for (index, can_read) in accepts.iter().enumerate() {
                formatters.push(Fixed::new(&format!("F{index}"), *can_read));
            }
            let http = json_context();
            let metadata = ModelMetadata::for_type::<Person>();
            let ctx = InputFormatterContext::new(&http, "p", &metadata, false);
            let sink = RecordingDiagnostics::new();

            let selected = formatters.select(&ctx, &sink).map(|f| f.name().to_string());
            let first = accepts.iter().position(|can_read| *can_read);

            prop_assert_eq!(selected, first.map(|index| format!("F{index}")));

            let events = sink.events();
            match first {
                Some(index) => {
                    prop_assert_eq!(events.len(), index + 1);
                    let rejected = events
                        .iter()
                        .filter(|e| matches!(e, DiagnosticEvent::RejectedInputFormatter { .. }))
                        .count();
                    prop_assert_eq!(rejected, index);
                    let is_selected = matches!(
                        events.last(),
                        Some(DiagnosticEvent::SelectedInputFormatter { .. })
                    );
                    prop_assert!(is_selected);
                }
                None => {
                    prop_assert_eq!(events.len(), accepts.len() + 1);
                    let is_none = matches!(
                        events.last(),
                        Some(DiagnosticEvent::NoInputFormatterFound { .. })
                    );
                    prop_assert!(is_none);
                }
            }
        }
    }
}
