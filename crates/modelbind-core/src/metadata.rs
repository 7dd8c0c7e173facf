//! Model metadata.

use crate::binding::Model;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Where a model's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    /// The request body, read by an input formatter.
    Body,
    /// Form fields.
    Form,
    /// The query string.
    Query,
    /// Route path parameters.
    Path,
    /// Request headers.
    Header,
    /// Application services.
    Services,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Body => "body",
            Self::Form => "form",
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Services => "services",
        };
        f.write_str(name)
    }
}

type MessageAccessor = Arc<dyn Fn() -> String + Send + Sync>;

/// Supplies the user-facing messages recorded during model binding.
///
/// Each message is produced by a replaceable accessor so applications can
/// localize or reword it.
///
/// # Example
///
/// ```
/// use modelbind_core::ModelBindingMessageProvider;
///
/// let mut provider = ModelBindingMessageProvider::default();
/// provider.set_missing_request_body_required_value_accessor(|| "Body required".to_string());
/// assert_eq!(provider.missing_request_body_required_value(), "Body required");
/// ```
#[derive(Clone)]
pub struct ModelBindingMessageProvider {
    missing_request_body_required_value: MessageAccessor,
}

impl ModelBindingMessageProvider {
    /// Message used when a body formatter produced no value.
    #[must_use]
    pub fn missing_request_body_required_value(&self) -> String {
        (self.missing_request_body_required_value)()
    }

    /// Replaces the missing-body message accessor.
    pub fn set_missing_request_body_required_value_accessor<F>(&mut self, accessor: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.missing_request_body_required_value = Arc::new(accessor);
    }
}

impl Default for ModelBindingMessageProvider {
    fn default() -> Self {
        Self {
            missing_request_body_required_value: Arc::new(|| {
                "A non-empty request body is required.".to_string()
            }),
        }
    }
}

impl fmt::Debug for ModelBindingMessageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBindingMessageProvider")
            .field(
                "missing_request_body_required_value",
                &self.missing_request_body_required_value(),
            )
            .finish()
    }
}

/// Describes the model a binding attempt targets.
///
/// Metadata is cheap to clone and is shared across requests.
///
/// # Example
///
/// ```
/// use modelbind_core::{BindingSource, ModelMetadata};
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
/// }
///
/// let metadata = ModelMetadata::for_default::<Person>().with_binding_source(BindingSource::Body);
/// assert!(metadata.is::<Person>());
/// assert!(metadata.default_value().is_some());
/// ```
#[derive(Clone)]
pub struct ModelMetadata {
    model_type: TypeId,
    type_name: &'static str,
    binding_source: Option<BindingSource>,
    message_provider: Arc<ModelBindingMessageProvider>,
    default_value: Option<fn() -> Model>,
}

fn default_model<T: Default + Send + Sync + 'static>() -> Model {
    Box::new(T::default())
}

impl ModelMetadata {
    /// Creates metadata for a type with no default value.
    #[must_use]
    pub fn for_type<T: Any + Send + Sync>() -> Self {
        Self {
            model_type: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            binding_source: None,
            message_provider: Arc::new(ModelBindingMessageProvider::default()),
            default_value: None,
        }
    }

    /// Creates metadata for a type whose default is used for empty input.
    #[must_use]
    pub fn for_default<T: Default + Send + Sync + 'static>() -> Self {
        Self {
            default_value: Some(default_model::<T>),
            ..Self::for_type::<T>()
        }
    }

    /// Sets the binding source.
    #[must_use]
    pub fn with_binding_source(mut self, source: BindingSource) -> Self {
        self.binding_source = Some(source);
        self
    }

    /// Sets the message provider.
    #[must_use]
    pub fn with_message_provider(mut self, provider: ModelBindingMessageProvider) -> Self {
        self.message_provider = Arc::new(provider);
        self
    }

    /// Returns the model's type ID.
    #[must_use]
    pub const fn model_type(&self) -> TypeId {
        self.model_type
    }

    /// Returns the model's type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the model is of type `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.model_type == TypeId::of::<T>()
    }

    /// Returns the binding source, if declared.
    #[must_use]
    pub const fn binding_source(&self) -> Option<BindingSource> {
        self.binding_source
    }

    /// Returns the message provider.
    #[must_use]
    pub fn message_provider(&self) -> &ModelBindingMessageProvider {
        &self.message_provider
    }

    /// Produces a fresh default value, if the type has one.
    #[must_use]
    pub fn default_value(&self) -> Option<Model> {
        self.default_value.map(|make| make())
    }
}

impl fmt::Debug for ModelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMetadata")
            .field("type_name", &self.type_name)
            .field("binding_source", &self.binding_source)
            .field("has_default", &self.default_value.is_some())
            .finish()
    }
}
