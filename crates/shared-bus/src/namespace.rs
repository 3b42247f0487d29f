//! # Namespaced Bus Views
//!
//! A namespace is a thin view over the shared bus whose operations prefix
//! every event name with `prefix:`. Modules get scoped channels without
//! separate bus instances, so cross-namespace subscribers still work by
//! using the fully qualified name.

use std::sync::Arc;

use crate::bus::{BusError, EventBus, EventData, ListenerId, ListenerResult};

/// Scoped view over an [`EventBus`].
#[derive(Clone)]
pub struct NamespacedBus {
    bus: Arc<EventBus>,
    prefix: String,
}

impl NamespacedBus {
    pub(crate) fn new(bus: Arc<EventBus>, prefix: &str) -> Self {
        Self {
            bus,
            prefix: prefix.to_string(),
        }
    }

    fn qualify(&self, event: &str) -> String {
        format!("{}:{}", self.prefix, event)
    }

    /// Register a persistent listener for the prefixed event.
    pub fn on<F>(&self, event: &str, callback: F) -> Result<ListenerId, BusError>
    where
        F: Fn(&EventData) -> ListenerResult + Send + Sync + 'static,
    {
        self.bus.on(&self.qualify(event), callback)
    }

    /// Register a once-listener for the prefixed event.
    pub fn once<F>(&self, event: &str, callback: F) -> Result<ListenerId, BusError>
    where
        F: Fn(&EventData) -> ListenerResult + Send + Sync + 'static,
    {
        self.bus.once(&self.qualify(event), callback)
    }

    /// Emit the prefixed event.
    pub fn emit(&self, event: &str, data: EventData) -> usize {
        self.bus.emit(&self.qualify(event), data)
    }

    /// Remove all listeners for the prefixed event.
    pub fn off(&self, event: &str) {
        self.bus.off(&self.qualify(event));
    }

    /// Remove one registration for the prefixed event.
    pub fn off_listener(&self, event: &str, id: ListenerId) -> bool {
        self.bus.off_listener(&self.qualify(event), id)
    }

    /// Nest a further namespace under this one.
    #[must_use]
    pub fn namespace(&self, prefix: &str) -> NamespacedBus {
        NamespacedBus {
            bus: Arc::clone(&self.bus),
            prefix: self.qualify(prefix),
        }
    }

    /// The fully qualified prefix of this view.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
