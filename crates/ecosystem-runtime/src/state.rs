//! # Observable State Store
//!
//! Key/value store whose every write publishes `state:changed` on the bus.
//! A plain setter with an explicit notify; collaborators subscribe to the
//! event instead of watching properties.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use shared_bus::EventBus;
use shared_types::events::topics;
use shared_types::StateChanged;

/// Observable key/value store owned by the orchestrator.
pub struct StateStore {
    values: RwLock<HashMap<String, Value>>,
    bus: Arc<EventBus>,
}

impl StateStore {
    /// Create an empty store publishing on `bus`.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Write `property` and publish `state:changed` with the new value.
    pub fn set(&self, property: &str, value: Value) {
        self.values
            .write()
            .insert(property.to_string(), value.clone());
        debug!(property, "state updated");

        let payload = StateChanged {
            property: property.to_string(),
            value,
        };
        self.bus.emit(
            topics::STATE_CHANGED,
            serde_json::to_value(payload).unwrap_or(Value::Null),
        );
    }

    /// Read `property`.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<Value> {
        self.values.read().get(property).cloned()
    }

    /// Copy of the whole store.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.read().clone()
    }
}
