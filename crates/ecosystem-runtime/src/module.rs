//! # Modules, Unit Handles and Ambient Context
//!
//! A loaded code unit yields a [`UnitHandle`]: the constructor for the
//! module it contains, returned directly from the fetch so nothing is ever
//! looked up in a shared namespace afterwards. The orchestrator invokes the
//! constructor with a [`ModuleContext`] carrying the ambient dependencies
//! every module receives.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use dependency_injector::ResolvedDeps;
use ecosystem_telemetry::ScopedLogger;
use shared_bus::EventBus;
use shared_utilities::SharedUtilities;

/// Error produced by a failing module constructor.
pub type ModuleInitError = Box<dyn std::error::Error + Send + Sync>;

/// A live feature module or core system instance.
pub trait Module: Send + Sync {
    /// The registered name of this instance.
    fn name(&self) -> &str;

    /// Downcast support for hosts that need the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl std::fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module").field("name", &self.name()).finish()
    }
}

/// The unit described by a descriptor did not contain the expected
/// constructor.
#[derive(Debug, Error)]
#[error("unit '{path}' provides '{provided}', descriptor expects '{expected}'")]
pub struct ClassRefMismatch {
    pub path: String,
    pub provided: String,
    pub expected: String,
}

/// Ambient dependencies handed to every module constructor.
#[derive(Clone)]
pub struct ModuleContext {
    /// Shared event bus handle.
    pub bus: Arc<EventBus>,
    /// Stateless helper bundle.
    pub utilities: SharedUtilities,
    /// Logger scoped to the module's name.
    pub logger: ScopedLogger,
    /// Read-only view of the already-loaded core systems.
    pub systems: SystemsView,
    /// The module's declared dependencies, resolved from the container.
    pub deps: ResolvedDeps,
}

type Constructor = Arc<dyn Fn(ModuleContext) -> Result<Arc<dyn Module>, ModuleInitError> + Send + Sync>;

/// Handle for a fetched code unit: its constructor plus the constructor
/// name used to cross-check the descriptor.
#[derive(Clone)]
pub struct UnitHandle {
    class_ref: String,
    constructor: Constructor,
}

impl UnitHandle {
    /// Wrap a constructor under its class name.
    pub fn new<F>(class_ref: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(ModuleContext) -> Result<Arc<dyn Module>, ModuleInitError> + Send + Sync + 'static,
    {
        Self {
            class_ref: class_ref.into(),
            constructor: Arc::new(constructor),
        }
    }

    /// The constructor name this unit provides.
    #[must_use]
    pub fn class_ref(&self) -> &str {
        &self.class_ref
    }

    /// Instantiate the module with the ambient context.
    pub fn construct(&self, context: ModuleContext) -> Result<Arc<dyn Module>, ModuleInitError> {
        (self.constructor)(context)
    }
}

impl std::fmt::Debug for UnitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitHandle")
            .field("class_ref", &self.class_ref)
            .finish()
    }
}

/// Read-only view of loaded core systems.
///
/// Only the orchestrator inserts; modules hold this view and may look
/// systems up but never mutate the map.
#[derive(Clone, Default)]
pub struct SystemsView {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Module>>>>,
}

impl SystemsView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, name: &str, instance: Arc<dyn Module>) {
        self.inner.write().insert(name.to_string(), instance);
    }

    pub(crate) fn clear(&self) {
        self.inner.write().clear();
    }

    /// Look up a loaded system by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.inner.read().get(name).cloned()
    }

    /// Names of loaded systems, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of loaded systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no system has loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
