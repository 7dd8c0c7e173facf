//! Typed per-request feature storage.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Type-keyed storage for per-request features.
///
/// Components earlier in the pipeline install features here so that later
/// readers can find them. At most one value of each type is stored.
///
/// # Example
///
/// ```
/// use modelbind_core::Features;
///
/// #[derive(Debug, PartialEq)]
/// struct Tenant(&'static str);
///
/// let mut features = Features::new();
/// features.insert(Tenant("acme"));
/// assert_eq!(features.get::<Tenant>(), Some(&Tenant("acme")));
/// ```
#[derive(Default)]
pub struct Features {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Features {
    /// Creates an empty feature map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a feature, returning the one it replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast().ok().map(|boxed| *boxed))
    }

    /// Returns a feature by type.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    /// Returns a feature mutably by type.
    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut())
    }

    /// Removes a feature by type.
    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast().ok().map(|boxed| *boxed))
    }

    /// Returns `true` if a feature of this type is installed.
    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of installed features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no features are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Features")
            .field("count", &self.entries.len())
            .finish()
    }
}
