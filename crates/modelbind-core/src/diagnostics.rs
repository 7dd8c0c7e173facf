//! Structured diagnostics for binding decisions.
//!
//! Every decision the formatter selector, body binder and form limits filter
//! make is reported as a [`DiagnosticEvent`] to a [`DiagnosticSink`]. Sinks
//! are purely observational and never influence control flow.
//!
//! # Sinks
//!
//! | Sink | Use |
//! |------|-----|
//! | [`TracingDiagnostics`] | Production: `tracing` events at `debug` level |
//! | [`RecordingDiagnostics`] | Tests: ordered in-memory capture |
//!
//! Event order is part of the contract: for one binding attempt, rejections
//! are reported in registration order before the selection.

use parking_lot::Mutex;
use std::fmt;
use tracing::debug;

/// A decision made while binding a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A formatter declined the request during selection.
    RejectedInputFormatter {
        /// Formatter name.
        formatter: String,
        /// Declared content type, empty if absent.
        content_type: String,
    },
    /// A formatter was chosen to read the request body.
    SelectedInputFormatter {
        /// Formatter name.
        formatter: String,
        /// Declared content type, empty if absent.
        content_type: String,
    },
    /// No registered formatter accepted the request.
    NoInputFormatterFound {
        /// Declared content type, empty if absent.
        content_type: String,
        /// Name of the binding that was attempted.
        model_name: String,
    },
    /// Developer hint emitted after [`Self::NoInputFormatterFound`].
    RemoveFromBodyAdvice {
        /// Name of the binding that was attempted.
        model_name: String,
        /// Target model type name.
        model_type: String,
    },
    /// The form limits filter installed its limits on the request.
    AppliedRequestFormLimits,
    /// The form was already read, so the limits filter could not apply.
    CannotApplyRequestFormLimits,
    /// A form limits filter was skipped because a more specific one governs.
    FormLimitsPolicyPreempted {
        /// The skipped policy.
        skipped: String,
        /// The policy that governs the request.
        governing: String,
    },
}

impl DiagnosticEvent {
    /// Returns a stable snake_case event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RejectedInputFormatter { .. } => "rejected_input_formatter",
            Self::SelectedInputFormatter { .. } => "selected_input_formatter",
            Self::NoInputFormatterFound { .. } => "no_input_formatter_found",
            Self::RemoveFromBodyAdvice { .. } => "remove_from_body_advice",
            Self::AppliedRequestFormLimits => "applied_request_form_limits",
            Self::CannotApplyRequestFormLimits => "cannot_apply_request_form_limits",
            Self::FormLimitsPolicyPreempted { .. } => "form_limits_policy_preempted",
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RejectedInputFormatter {
                formatter,
                content_type,
            } => write!(
                f,
                "Rejected input formatter '{formatter}' for content type '{content_type}'."
            ),
            Self::SelectedInputFormatter {
                formatter,
                content_type,
            } => write!(
                f,
                "Selected input formatter '{formatter}' for content type '{content_type}'."
            ),
            Self::NoInputFormatterFound { content_type, .. } => write!(
                f,
                "No input formatter was found to support the content type '{content_type}' \
                 for use with the [FromBody] attribute."
            ),
            Self::RemoveFromBodyAdvice {
                model_name,
                model_type,
            } => write!(
                f,
                "To use model binding, remove the [FromBody] attribute from the property or \
                 parameter named '{model_name}' with model type '{model_type}'."
            ),
            Self::AppliedRequestFormLimits => {
                f.write_str("Applied the configured form options on the current request.")
            }
            Self::CannotApplyRequestFormLimits => f.write_str(
                "Unable to apply configured form options since the request form has already been read.",
            ),
            Self::FormLimitsPolicyPreempted { skipped, governing } => write!(
                f,
                "Execution of form limits policy '{skipped}' is preempted by policy \
                 '{governing}' which is the most effective form limits policy."
            ),
        }
    }
}

/// Receives binding diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Records one event.
    fn emit(&self, event: DiagnosticEvent);
}

/// Writes diagnostics as `tracing` events at `debug` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        let name = event.name();
        match &event {
            DiagnosticEvent::RejectedInputFormatter {
                formatter,
                content_type,
            }
            | DiagnosticEvent::SelectedInputFormatter {
                formatter,
                content_type,
            } => debug!(event = name, formatter = %formatter, content_type = %content_type, "{event}"),
            DiagnosticEvent::NoInputFormatterFound {
                content_type,
                model_name,
            } => debug!(event = name, content_type = %content_type, model_name = %model_name, "{event}"),
            DiagnosticEvent::RemoveFromBodyAdvice {
                model_name,
                model_type,
            } => debug!(event = name, model_name = %model_name, model_type = %model_type, "{event}"),
            DiagnosticEvent::FormLimitsPolicyPreempted { skipped, .. } => {
                debug!(event = name, policy_id = %skipped, "{event}");
            }
            DiagnosticEvent::AppliedRequestFormLimits
            | DiagnosticEvent::CannotApplyRequestFormLimits => debug!(event = name, "{event}"),
        }
    }
}

/// Captures diagnostics in memory, in emission order.
///
/// # Example
///
/// ```
/// use modelbind_core::{DiagnosticEvent, DiagnosticSink, RecordingDiagnostics};
///
/// let sink = RecordingDiagnostics::new();
/// sink.emit(DiagnosticEvent::AppliedRequestFormLimits);
/// assert_eq!(sink.messages(), vec!["Applied the configured form options on the current request."]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Returns the rendered message of every recorded event.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Discards recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_messages() {
        let rejected = DiagnosticEvent::RejectedInputFormatter {
            formatter: "JsonFormatter".to_string(),
            content_type: "application/json".to_string(),
        };
        assert_eq!(
            rejected.to_string(),
            "Rejected input formatter 'JsonFormatter' for content type 'application/json'."
        );

        let selected = DiagnosticEvent::SelectedInputFormatter {
            formatter: "JsonFormatter".to_string(),
            content_type: "application/json".to_string(),
        };
        assert_eq!(
            selected.to_string(),
            "Selected input formatter 'JsonFormatter' for content type 'application/json'."
        );
    }

    #[test]
    fn test_no_formatter_messages() {
        let none = DiagnosticEvent::NoInputFormatterFound {
            content_type: "multipart/form-data".to_string(),
            model_name: "someName".to_string(),
        };
        assert_eq!(
            none.to_string(),
            "No input formatter was found to support the content type 'multipart/form-data' \
             for use with the [FromBody] attribute."
        );

        let advice = DiagnosticEvent::RemoveFromBodyAdvice {
            model_name: "someName".to_string(),
            model_type: "app::Person".to_string(),
        };
        assert_eq!(
            advice.to_string(),
            "To use model binding, remove the [FromBody] attribute from the property or \
             parameter named 'someName' with model type 'app::Person'."
        );
    }

    #[test]
    fn test_event_names_are_distinct() {
        let events = [
            DiagnosticEvent::AppliedRequestFormLimits,
            DiagnosticEvent::CannotApplyRequestFormLimits,
            DiagnosticEvent::FormLimitsPolicyPreempted {
                skipped: "a".to_string(),
                governing: "b".to_string(),
            },
        ];
        let names: Vec<_> = events.iter().map(DiagnosticEvent::name).collect();
        assert_eq!(
            names,
            vec![
                "applied_request_form_limits",
                "cannot_apply_request_form_limits",
                "form_limits_policy_preempted"
            ]
        );
    }

    #[test]
    fn test_recording_preserves_order() {
        let sink = RecordingDiagnostics::new();
        sink.emit(DiagnosticEvent::CannotApplyRequestFormLimits);
        sink.emit(DiagnosticEvent::AppliedRequestFormLimits);

        assert_eq!(
            sink.events(),
            vec![
                DiagnosticEvent::CannotApplyRequestFormLimits,
                DiagnosticEvent::AppliedRequestFormLimits
            ]
        );
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_every_event() {
        let sink = TracingDiagnostics;
        sink.emit(DiagnosticEvent::AppliedRequestFormLimits);
        sink.emit(DiagnosticEvent::RejectedInputFormatter {
            formatter: "F".to_string(),
            content_type: String::new(),
        });
    }
}
