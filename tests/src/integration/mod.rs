//! # Integration Tests
//!
//! Shared fixtures for driving a full `EcosystemApp` against synthetic
//! catalogs and unit sources.

mod kernel_properties;
mod module_loading;
mod startup;

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use ecosystem_runtime::{Module, ModuleContext, UnitHandle};
use shared_bus::EventBus;

/// Minimal module recording how often its constructor ran.
pub struct Probe {
    name: String,
}

impl Module for Probe {
    fn name(&self) -> &str {
        &self.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Unit handle constructing a [`Probe`], counting constructions.
pub fn probe_unit(class_ref: &str, name: &str, constructions: &Arc<AtomicUsize>) -> UnitHandle {
    let name = name.to_string();
    let constructions = Arc::clone(constructions);
    UnitHandle::new(class_ref, move |_ctx: ModuleContext| {
        constructions.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Probe { name: name.clone() }) as Arc<dyn Module>)
    })
}

/// Collects every payload emitted for one event name.
pub fn collect_events(bus: &Arc<EventBus>, event: &str) -> Arc<Mutex<Vec<Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.on(event, move |data| {
        sink.lock().push(data.clone());
        Ok(())
    })
    .expect("bus alive");
    seen
}
