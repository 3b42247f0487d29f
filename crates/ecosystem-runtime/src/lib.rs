//! # TokenHive Ecosystem Runtime
//!
//! The orchestrator for the TokenHive module ecosystem. Owns the startup
//! sequence and the module lifecycle; the only component aware of the
//! required-vs-optional distinction.
//!
//! ## Startup Sequence
//!
//! ```text
//! init()
//!   ├─ 1. wire container defaults (eventBus, sharedUtilities, logger,
//!   │     stateStore, storage) + diagnostics + eager warm-up     [fatal]
//!   ├─ 2. wire lifecycle event channels
//!   ├─ 3. load core systems, sequential by priority
//!   │       required system failed  → abort                      [fatal]
//!   │       optional system failed  → system:error, continue
//!   ├─ 4. register module descriptors          → module:register
//!   ├─ 5. auto-load flagged modules, concurrent, failures isolated
//!   ├─ 6. arm fault sink
//!   └─ ready flag + ecosystem:ready (exactly once)
//! ```
//!
//! On a fatal failure `ecosystem:error` is emitted exactly once with the
//! originating cause and `ecosystem:ready` is never emitted; the guard is
//! released so a later `init` may retry.
//!
//! ## Modular Structure
//!
//! - `config` - runtime parameters and the system/module catalogs
//! - `module` - the `Module` trait, unit handles and ambient context
//! - `state` - observable key/value store publishing `state:changed`
//! - `faults` - error funnel between host hooks and the bus
//! - `storage` - default in-memory storage registration
//! - `collaborators` - built-in host systems/modules and their unit source

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod collaborators;
pub mod config;
pub mod faults;
pub mod module;
pub mod state;
pub mod storage;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use dependency_injector::{DependencyInjector, InjectorError, Provider};
use module_loader::{ResourceLoader, UnitSource};
use shared_bus::{BusError, EventBus};
use shared_types::events::topics;
use shared_types::{ModuleFailed, ModuleLoaded, ModuleRegistered, ModuleSpec, SystemFailed};
use shared_utilities::SharedUtilities;

pub use config::EcosystemConfig;
pub use faults::FaultSink;
pub use module::{ClassRefMismatch, Module, ModuleContext, ModuleInitError, SystemsView, UnitHandle};
pub use state::StateStore;
pub use storage::InMemoryStorage;

use ecosystem_telemetry::ScopedLogger;

/// Cause of a failed load step, preserved through the public error.
pub type LoadCause = Box<dyn std::error::Error + Send + Sync>;

/// Errors from the orchestrator.
#[derive(Debug, Error)]
pub enum EcosystemError {
    /// Wiring the ambient container defaults failed.
    #[error("core wiring failed: {source}")]
    CoreWiring {
        #[source]
        source: InjectorError,
    },

    /// The event bus refused registration during startup.
    #[error("event bus unavailable: {source}")]
    Bus {
        #[source]
        source: BusError,
    },

    /// A load-bearing system failed to load.
    #[error("required system '{name}' failed to load: {source}")]
    RequiredSystem {
        name: String,
        #[source]
        source: LoadCause,
    },

    /// `load_module` was called for a name that was never registered.
    #[error("module '{0}' not found")]
    ModuleNotFound(String),

    /// A module failed to load; the descriptor stays registered for retry.
    #[error("failed to load module '{name}': {source}")]
    ModuleLoad {
        name: String,
        #[source]
        source: LoadCause,
    },

    /// `wait_ready` exceeded its deadline.
    #[error("ecosystem not ready after {0:?}")]
    ReadyTimeout(Duration),
}

#[derive(Clone)]
struct ModuleEntry {
    spec: ModuleSpec,
    instance: Arc<RwLock<Option<Arc<dyn Module>>>>,
    /// Serializes loading per module so concurrent callers coalesce onto
    /// one fetch and one instantiation.
    load_lock: Arc<tokio::sync::Mutex<()>>,
}

impl ModuleEntry {
    fn new(spec: ModuleSpec) -> Self {
        Self {
            spec,
            instance: Arc::new(RwLock::new(None)),
            load_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn loaded(&self) -> Option<Arc<dyn Module>> {
        self.instance.read().clone()
    }
}

/// The ecosystem orchestrator.
///
/// Explicitly constructed and passed by reference; `init` and `teardown`
/// bound its lifecycle. All descriptor and instance maps are owned here and
/// mutated by no other component.
pub struct EcosystemApp {
    config: EcosystemConfig,
    bus: Arc<EventBus>,
    injector: Arc<DependencyInjector>,
    utilities: SharedUtilities,
    loader: ResourceLoader<UnitHandle>,
    systems: SystemsView,
    modules: RwLock<HashMap<String, ModuleEntry>>,
    state: Arc<StateStore>,
    faults: FaultSink,
    loading: AtomicBool,
    initialized: AtomicBool,
    channels_wired: AtomicBool,
    ready_tx: watch::Sender<bool>,
    // Keeps the watch channel alive for late subscribers.
    _ready_rx: watch::Receiver<bool>,
}

impl EcosystemApp {
    /// Construct the orchestrator over a host-supplied unit source.
    ///
    /// Nothing is loaded yet; call [`EcosystemApp::init`].
    pub fn new(config: EcosystemConfig, source: Arc<dyn UnitSource<UnitHandle>>) -> Arc<Self> {
        let bus = Arc::new(EventBus::with_max_listeners(config.max_listeners));
        let (ready_tx, ready_rx) = watch::channel(false);
        Arc::new(Self {
            bus: Arc::clone(&bus),
            injector: Arc::new(DependencyInjector::new()),
            utilities: SharedUtilities::new(),
            loader: ResourceLoader::new(source),
            systems: SystemsView::new(),
            modules: RwLock::new(HashMap::new()),
            state: Arc::new(StateStore::new(Arc::clone(&bus))),
            faults: FaultSink::new(bus),
            loading: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            channels_wired: AtomicBool::new(false),
            ready_tx,
            _ready_rx: ready_rx,
            config,
        })
    }

    /// Run the startup sequence.
    ///
    /// Idempotent: calls while startup is running or after it completed are
    /// no-ops. A fatal failure releases the guard so a retry is possible.
    pub async fn init(self: &Arc<Self>) -> Result<(), EcosystemError> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self.loading.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!("initializing TokenHive ecosystem");
        let result = self.run_startup().await;

        match &result {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                let _ = self.ready_tx.send(true);
                self.bus.emit(topics::ECOSYSTEM_READY, json!({}));
                info!(
                    systems = self.systems.len(),
                    modules = self.modules.read().len(),
                    "ecosystem ready"
                );
            }
            Err(e) => {
                self.faults.report_fatal("ecosystem startup", e);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    async fn run_startup(self: &Arc<Self>) -> Result<(), EcosystemError> {
        // Phase 1: ambient container defaults are load-bearing for
        // everything after them.
        self.wire_defaults()
            .map_err(|source| EcosystemError::CoreWiring { source })?;
        for issue in self.injector.validate() {
            warn!(%issue, "container diagnostics");
        }
        self.injector.warm();

        // Phase 2: lifecycle channels.
        self.setup_event_channels()
            .map_err(|source| EcosystemError::Bus { source })?;

        // Phase 3: core systems, sequential by priority.
        self.load_core_systems().await?;

        // Phase 4: module descriptors, metadata only.
        for spec in self.config.modules.clone() {
            self.register_module(spec);
        }

        // Phase 5: auto-load fan-out.
        if self.config.auto_load {
            self.auto_load_modules().await;
        }

        // Phase 6: the fault sink is live from construction; startup only
        // confirms the funnel is armed for host hooks.
        debug!("fault sink armed");

        Ok(())
    }

    /// Idempotent so a retried `init` never trips over its own defaults.
    fn wire_defaults(&self) -> Result<(), InjectorError> {
        let defaults: [(&str, Provider); 5] = [
            ("eventBus", Provider::shared(Arc::clone(&self.bus) as dependency_injector::Instance)),
            ("sharedUtilities", Provider::value(self.utilities)),
            ("logger", Provider::value(ScopedLogger::new("ecosystem"))),
            ("stateStore", Provider::shared(Arc::clone(&self.state) as dependency_injector::Instance)),
            (
                "storage",
                Provider::factory(|_| {
                    Ok(Arc::new(InMemoryStorage::new()) as dependency_injector::Instance)
                }),
            ),
        ];
        for (name, provider) in defaults {
            if !self.injector.has(name) {
                self.injector.singleton(name, provider)?;
            }
        }
        debug!("container defaults wired");
        Ok(())
    }

    fn setup_event_channels(&self) -> Result<(), BusError> {
        if self.channels_wired.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.bus.on(topics::MODULE_REGISTER, |data| {
            debug!(name = %data["name"], "module registered");
            Ok(())
        })?;
        self.bus.on(topics::MODULE_LOAD, |data| {
            debug!(name = %data["name"], "module loaded");
            Ok(())
        })?;
        self.bus.on(topics::MODULE_ERROR, |data| {
            warn!(name = %data["name"], error = %data["error"], "module error");
            Ok(())
        })?;
        self.bus.on(topics::SYSTEM_ERROR, |data| {
            warn!(name = %data["name"], error = %data["error"], "system error");
            Ok(())
        })?;
        self.bus.on(topics::NAVIGATION_CHANGE, |data| {
            debug!(state = %data["state"], "navigation changed");
            Ok(())
        })?;
        self.bus.on(topics::PAGE_LOAD, |data| {
            debug!(page = %data["page"], "page loaded");
            Ok(())
        })?;
        debug!("lifecycle event channels wired");
        Ok(())
    }

    async fn load_core_systems(self: &Arc<Self>) -> Result<(), EcosystemError> {
        for spec in self.config.systems_by_priority() {
            // A retried init keeps systems that already came up.
            if self.systems.get(&spec.name).is_some() {
                continue;
            }
            match self.load_unit(&spec.name, &spec.path, &spec.class_ref, &spec.dependencies).await {
                Ok(instance) => {
                    self.systems.insert(&spec.name, instance);
                    info!(system = %spec.name, priority = spec.priority, "system loaded");
                }
                Err(source) if spec.required => {
                    return Err(EcosystemError::RequiredSystem {
                        name: spec.name,
                        source,
                    });
                }
                Err(source) => {
                    // Optional systems degrade the ecosystem instead of
                    // halting it.
                    warn!(system = %spec.name, error = %source, "optional system failed");
                    let payload = SystemFailed {
                        name: spec.name.clone(),
                        error: source.to_string(),
                    };
                    self.bus.emit(
                        topics::SYSTEM_ERROR,
                        serde_json::to_value(payload).unwrap_or(Value::Null),
                    );
                }
            }
        }
        Ok(())
    }

    /// Register a module descriptor (metadata only; nothing is loaded).
    ///
    /// Duplicate names are skipped with a warning, keeping the first
    /// registration. Returns whether the descriptor was accepted.
    pub fn register_module(&self, spec: ModuleSpec) -> bool {
        let name = spec.name.clone();
        {
            let mut modules = self.modules.write();
            if modules.contains_key(&name) {
                warn!(module = %name, "module already registered");
                return false;
            }
            modules.insert(name.clone(), ModuleEntry::new(spec.clone()));
        }

        let payload = ModuleRegistered {
            name,
            auto_load: spec.auto_load,
        };
        self.bus.emit(
            topics::MODULE_REGISTER,
            serde_json::to_value(payload).unwrap_or(Value::Null),
        );
        true
    }

    async fn auto_load_modules(self: &Arc<Self>) {
        let auto: Vec<String> = {
            let modules = self.modules.read();
            let mut names: Vec<String> = modules
                .values()
                .filter(|entry| entry.spec.auto_load)
                .map(|entry| entry.spec.name.clone())
                .collect();
            names.sort_unstable();
            names
        };
        if auto.is_empty() {
            return;
        }

        // Concurrent fan-out; one failed module never cancels the others.
        let mut loads = JoinSet::new();
        for name in auto {
            let app = Arc::clone(self);
            loads.spawn(async move {
                let result = app.load_module(&name).await;
                (name, result.err())
            });
        }
        while let Some(joined) = loads.join_next().await {
            match joined {
                Ok((name, None)) => debug!(module = %name, "auto-load complete"),
                Ok((name, Some(e))) => warn!(module = %name, error = %e, "auto-load failed"),
                Err(e) => warn!(error = %e, "auto-load task failed"),
            }
        }
    }

    /// Load a registered module on demand.
    ///
    /// Idempotent: an already-loaded module returns its cached instance
    /// without touching the loader. Concurrent callers for the same module
    /// coalesce onto one fetch and one instantiation. On failure the
    /// descriptor stays non-loaded, `module:error` is published and the
    /// cause is returned.
    pub async fn load_module(
        self: &Arc<Self>,
        name: &str,
    ) -> Result<Arc<dyn Module>, EcosystemError> {
        let entry = self
            .modules
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EcosystemError::ModuleNotFound(name.to_string()))?;

        if let Some(instance) = entry.loaded() {
            return Ok(instance);
        }

        let _guard = entry.load_lock.lock().await;
        // A coalesced caller may have finished the load while we waited.
        if let Some(instance) = entry.loaded() {
            return Ok(instance);
        }

        info!(module = %name, "loading module");
        let spec = &entry.spec;
        match self
            .load_unit(&spec.name, &spec.path, &spec.class_ref, &spec.dependencies)
            .await
        {
            Ok(instance) => {
                *entry.instance.write() = Some(Arc::clone(&instance));
                let payload = ModuleLoaded {
                    name: name.to_string(),
                };
                self.bus.emit(
                    topics::MODULE_LOAD,
                    serde_json::to_value(payload).unwrap_or(Value::Null),
                );
                info!(module = %name, "module loaded");
                Ok(instance)
            }
            Err(source) => {
                let payload = ModuleFailed {
                    name: name.to_string(),
                    error: source.to_string(),
                };
                self.bus.emit(
                    topics::MODULE_ERROR,
                    serde_json::to_value(payload).unwrap_or(Value::Null),
                );
                Err(EcosystemError::ModuleLoad {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }

    async fn load_unit(
        &self,
        name: &str,
        path: &str,
        class_ref: &str,
        dependencies: &[String],
    ) -> Result<Arc<dyn Module>, LoadCause> {
        let handle = self.loader.load(path).await?;
        if handle.class_ref() != class_ref {
            return Err(Box::new(ClassRefMismatch {
                path: path.to_string(),
                provided: handle.class_ref().to_string(),
                expected: class_ref.to_string(),
            }));
        }

        let deps = self.injector.resolve_all(dependencies)?;
        let context = ModuleContext {
            bus: Arc::clone(&self.bus),
            utilities: self.utilities,
            logger: ScopedLogger::new(name),
            systems: self.systems.clone(),
            deps,
        };
        handle.construct(context)
    }

    // =========================================================================
    // LOOKUPS & READINESS
    // =========================================================================

    /// Loaded module instance, or `None` while unregistered or unloaded.
    #[must_use]
    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.read().get(name)?.loaded()
    }

    /// Loaded system instance, or `None`.
    #[must_use]
    pub fn get_system(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.systems.get(name)
    }

    /// Registered module names, sorted.
    #[must_use]
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Whether startup completed successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Run `callback` once the ecosystem is ready.
    ///
    /// Fires immediately when already ready; otherwise fires on the
    /// `ecosystem:ready` emission. Exactly once either way.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let fired = Arc::new(std::sync::Once::new());
        let callback = Arc::new(callback);

        let once_fired = Arc::clone(&fired);
        let once_callback = Arc::clone(&callback);
        let _ = self.bus.once(topics::ECOSYSTEM_READY, move |_| {
            once_fired.call_once(|| once_callback());
            Ok(())
        });

        if self.is_ready() {
            fired.call_once(|| callback());
        }
    }

    /// Block until ready or until `limit` elapses.
    pub async fn wait_ready(&self, limit: Duration) -> Result<(), EcosystemError> {
        let mut ready = self.ready_tx.subscribe();
        if *ready.borrow() {
            return Ok(());
        }
        tokio::time::timeout(limit, ready.wait_for(|flag| *flag))
            .await
            .map_err(|_| EcosystemError::ReadyTimeout(limit))?
            .map_err(|_| EcosystemError::ReadyTimeout(limit))?;
        Ok(())
    }

    /// Block until ready using the configured default deadline.
    pub async fn wait_ready_default(&self) -> Result<(), EcosystemError> {
        self.wait_ready(self.config.ready_timeout).await
    }

    // =========================================================================
    // STATE & ACCESSORS
    // =========================================================================

    /// Write observable state; publishes `state:changed`.
    pub fn set_state(&self, property: &str, value: Value) {
        self.state.set(property, value);
    }

    /// Read observable state.
    #[must_use]
    pub fn get_state(&self, property: &str) -> Option<Value> {
        self.state.get(property)
    }

    /// The shared event bus.
    #[must_use]
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// The dependency container.
    #[must_use]
    pub fn injector(&self) -> Arc<DependencyInjector> {
        Arc::clone(&self.injector)
    }

    /// The resource loader.
    #[must_use]
    pub fn loader(&self) -> &ResourceLoader<UnitHandle> {
        &self.loader
    }

    /// The helper bundle injected into modules.
    #[must_use]
    pub fn utilities(&self) -> SharedUtilities {
        self.utilities
    }

    /// Handle for host fault hooks.
    #[must_use]
    pub fn fault_sink(&self) -> FaultSink {
        self.faults.clone()
    }

    /// The runtime configuration.
    #[must_use]
    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    /// Log a status overview of systems and modules.
    pub fn log_status(&self) {
        info!("===========================================");
        info!("  TOKENHIVE ECOSYSTEM STATUS");
        info!("===========================================");
        for name in self.systems.names() {
            info!("  system  {:20} loaded", name);
        }
        let modules = self.modules.read();
        let mut names: Vec<&String> = modules.keys().collect();
        names.sort_unstable();
        for name in names {
            let state = if modules[name].loaded().is_some() {
                "loaded"
            } else {
                "registered"
            };
            info!("  module  {:20} {}", name, state);
        }
        info!("===========================================");
    }

    /// Tear the ecosystem down: clears descriptors, instances and the
    /// container, and destroys the bus. The instance cannot be re-initialized
    /// afterwards.
    pub fn teardown(&self) {
        info!("tearing down ecosystem");
        self.modules.write().clear();
        self.systems.clear();
        self.injector.clear();
        self.bus.destroy();
        let _ = self.ready_tx.send(false);
    }
}
