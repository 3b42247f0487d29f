//! # Fault Sink
//!
//! The kernel's error funnel. The hosting environment wires its platform
//! hooks (uncaught errors, rejected promises, history navigation) to one of
//! these handles; the kernel itself never names a platform hook.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use shared_bus::EventBus;
use shared_types::events::topics;
use shared_types::EcosystemFault;

/// Cloneable handle funneling host faults and navigation into the bus.
#[derive(Clone)]
pub struct FaultSink {
    bus: Arc<EventBus>,
}

impl FaultSink {
    /// Create a sink publishing on `bus`.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// Report a fatal fault: logs it and publishes `ecosystem:error`.
    ///
    /// Returns the fault id correlating the log line with the bus event.
    pub fn report_fatal(&self, context: &str, fault: &dyn std::fmt::Display) -> String {
        let fault_id = Uuid::new_v4().to_string();
        let message = fault.to_string();
        error!(fault_id = %fault_id, context, %message, "ecosystem fault");

        let payload = EcosystemFault {
            fault_id: fault_id.clone(),
            context: context.to_string(),
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.bus.emit(
            topics::ECOSYSTEM_ERROR,
            serde_json::to_value(payload).unwrap_or(Value::Null),
        );
        fault_id
    }

    /// Funnel a host navigation change into the bus.
    pub fn navigation_changed(&self, state: Value) {
        self.bus.emit(topics::NAVIGATION_CHANGE, json!({ "state": state }));
    }

    /// Funnel a host page load into the bus.
    pub fn page_loaded(&self, page: &str) {
        self.bus.emit(topics::PAGE_LOAD, json!({ "page": page }));
    }
}
