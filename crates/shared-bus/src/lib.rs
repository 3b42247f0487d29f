//! # Shared Bus - Event Bus for Inter-Module Communication
//!
//! In-process publish/subscribe hub decoupling producers and consumers of
//! named lifecycle and state-change notifications.
//!
//! ## Architecture Rules
//!
//! - All inter-module communication goes via the Shared Bus ONLY
//! - Direct calls between feature modules are FORBIDDEN
//! - Delivery is synchronous and in registration order
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │   Module A   │                    │   Module B   │
//! │              │     emit()         │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  │              │   on() / once()
//!                  └──────────────┘
//! ```
//!
//! ## Failure Containment
//!
//! - A listener returning an error is logged and never stops its siblings
//! - Middleware errors fail open: the emission proceeds with the payload the
//!   failing middleware received
//! - Destroying the bus clears every table and blocks further registration

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod middleware;
pub mod namespace;

// Re-export main types
pub use bus::{BusError, BusStats, EventBus, EventData, ListenerId, ListenerResult};
pub use middleware::{Middleware, MiddlewareAction, MiddlewareResult};
pub use namespace::NamespacedBus;

/// Soft limit on listeners per event name before a warning is logged.
pub const DEFAULT_MAX_LISTENERS: usize = 100;
