//! # Providers and Resolved Dependency Bags
//!
//! A registration's provider is either a factory invoked with the resolved
//! bag of its declared dependencies, or a plain shared value returned as-is.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A resolved instance. Consumers downcast through [`ResolvedDeps::get`].
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Error produced by a failing factory.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// Factory closure invoked with the resolved dependency bag.
pub type FactoryFn = Arc<dyn Fn(&ResolvedDeps) -> Result<Instance, FactoryError> + Send + Sync>;

/// What a registration produces when resolved.
#[derive(Clone)]
pub enum Provider {
    /// Invoked once per resolution (or once ever, for singletons) with the
    /// resolved dependency bag.
    Factory(FactoryFn),
    /// Returned as-is; a value cannot consume dependencies.
    Value(Instance),
}

impl Provider {
    /// Wrap a fallible factory closure.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&ResolvedDeps) -> Result<Instance, FactoryError> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// Wrap an owned value as a shared instance.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::Value(Arc::new(value))
    }

    /// Wrap an already-shared instance.
    #[must_use]
    pub fn shared(instance: Instance) -> Self {
        Self::Value(instance)
    }

    /// Whether this provider is a plain value.
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Factory(_) => f.write_str("Provider::Factory"),
            Self::Value(_) => f.write_str("Provider::Value"),
        }
    }
}

/// Registration options.
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Cache the first resolved instance for the container's lifetime.
    pub singleton: bool,
    /// Registrations resolved (left-to-right) into the factory's bag.
    pub dependencies: Vec<String>,
    /// Skip this registration during eager warm-up; resolve on first use.
    pub lazy: bool,
}

impl RegisterOptions {
    /// Options for a memoized registration.
    #[must_use]
    pub fn singleton() -> Self {
        Self {
            singleton: true,
            ..Self::default()
        }
    }

    /// Declare the registrations this factory consumes.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = names.into_iter().map(Into::into).collect();
        self
    }

    /// Defer this registration to first use during warm-up.
    #[must_use]
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

/// Bag of resolved dependencies keyed by registration name, handed to a
/// factory in declaration order.
#[derive(Default, Clone)]
pub struct ResolvedDeps {
    entries: HashMap<String, Instance>,
    order: Vec<String>,
}

impl ResolvedDeps {
    pub(crate) fn insert(&mut self, name: String, instance: Instance) {
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, instance);
    }

    /// Typed accessor; `None` when the name is absent or the type differs.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()?.downcast::<T>().ok()
    }

    /// Untyped accessor.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<Instance> {
        self.entries.get(name).cloned()
    }

    /// Dependency names in declaration (resolution) order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResolvedDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedDeps")
            .field("names", &self.order)
            .finish()
    }
}
