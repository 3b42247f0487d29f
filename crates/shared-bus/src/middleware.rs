//! # Emission Middleware
//!
//! Transforms that run before listeners see an event. A middleware can pass
//! the payload through, replace it, or suppress the emission entirely.
//!
//! Composition is last-registered-wraps-previous: the most recently installed
//! middleware inspects the event first, and whatever it forwards flows through
//! the earlier ones before delivery.

use std::sync::Arc;

use crate::bus::EventData;

/// Decision returned by a middleware for one emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareAction {
    /// Forward the payload unchanged.
    Keep,
    /// Forward a replacement payload.
    Replace(EventData),
    /// Drop the emission; no listener runs.
    Suppress,
}

/// Outcome of one middleware invocation.
///
/// An `Err` fails open: the bus logs it and continues the chain with the
/// payload this middleware received, so a buggy middleware can never silently
/// drop an event.
pub type MiddlewareResult = Result<MiddlewareAction, Box<dyn std::error::Error + Send + Sync>>;

/// Installed middleware transform.
pub type Middleware = Arc<dyn Fn(&str, &EventData) -> MiddlewareResult + Send + Sync>;
