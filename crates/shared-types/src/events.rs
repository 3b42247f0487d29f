//! # Lifecycle Event Contracts
//!
//! Event names and canonical payload shapes published on the shared bus
//! during the ecosystem lifecycle. External collaborators subscribe to these
//! names; the payload structs serialize to the JSON values carried on the bus.

use serde::{Deserialize, Serialize};

/// Well-known lifecycle event names.
pub mod topics {
    /// A module descriptor was registered (metadata only, nothing loaded).
    pub const MODULE_REGISTER: &str = "module:register";
    /// A module finished loading and instantiation.
    pub const MODULE_LOAD: &str = "module:load";
    /// A module failed to load; the descriptor stays registered for retry.
    pub const MODULE_ERROR: &str = "module:error";
    /// An optional core system failed to load; startup continued degraded.
    pub const SYSTEM_ERROR: &str = "system:error";
    /// Startup completed; emitted exactly once per successful `init`.
    pub const ECOSYSTEM_READY: &str = "ecosystem:ready";
    /// Fatal startup failure or a fault reported through the sink.
    pub const ECOSYSTEM_ERROR: &str = "ecosystem:error";
    /// A key in the observable state store was written.
    pub const STATE_CHANGED: &str = "state:changed";
    /// Host navigation change funneled through the fault sink.
    pub const NAVIGATION_CHANGE: &str = "navigation:change";
    /// Host page load funneled through the fault sink.
    pub const PAGE_LOAD: &str = "page:load";
}

/// Payload for [`topics::MODULE_REGISTER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRegistered {
    pub name: String,
    pub auto_load: bool,
}

/// Payload for [`topics::MODULE_LOAD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLoaded {
    pub name: String,
}

/// Payload for [`topics::MODULE_ERROR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFailed {
    pub name: String,
    pub error: String,
}

/// Payload for [`topics::SYSTEM_ERROR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFailed {
    pub name: String,
    pub error: String,
}

/// Payload for [`topics::STATE_CHANGED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChanged {
    pub property: String,
    pub value: serde_json::Value,
}

/// Payload for [`topics::ECOSYSTEM_ERROR`].
///
/// `fault_id` correlates the bus event with the log line emitted by the
/// fault sink; `timestamp` is an RFC 3339 string set by the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemFault {
    pub fault_id: String,
    pub context: String,
    pub message: String,
    pub timestamp: String,
}
