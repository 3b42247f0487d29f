//! # Event Bus Core
//!
//! Listener tables, registration and synchronous emission.
//!
//! ## Locking
//!
//! Listener tables live behind a single `parking_lot::RwLock`. The lock is
//! never held across a listener or middleware invocation, so listeners may
//! re-enter the bus (register, emit, remove) without deadlocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::middleware::{Middleware, MiddlewareAction};
use crate::namespace::NamespacedBus;
use crate::DEFAULT_MAX_LISTENERS;

/// Payload carried by every event.
pub type EventData = serde_json::Value;

/// Outcome of a single listener invocation. Errors are contained by `emit`.
pub type ListenerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type ListenerFn = Arc<dyn Fn(&EventData) -> ListenerResult + Send + Sync>;

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus was destroyed; no further registration is possible.
    #[error("event bus destroyed")]
    Destroyed,
}

/// Handle identifying one listener registration.
///
/// Returned by [`EventBus::on`] and [`EventBus::once`]; the same closure
/// registered twice yields two ids and fires twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    callback: ListenerFn,
}

#[derive(Default)]
struct BusState {
    events: HashMap<String, Vec<ListenerEntry>>,
    once_events: HashMap<String, Vec<ListenerEntry>>,
    middlewares: Vec<Middleware>,
    destroyed: bool,
}

/// Bus statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusStats {
    /// Distinct event names with at least one listener (either bucket).
    pub total_events: usize,
    /// Event names with persistent listeners.
    pub normal_events: usize,
    /// Event names with pending once-listeners.
    pub once_events: usize,
    /// Listener registrations across both buckets.
    pub total_listeners: usize,
    /// Current soft limit per event name.
    pub max_listeners: usize,
}

/// Process-wide publish/subscribe hub.
///
/// Delivery is fully synchronous: `emit` returns only after every listener
/// for the name has run. Listener failures are logged and contained.
pub struct EventBus {
    state: RwLock<BusState>,
    next_listener_id: AtomicU64,
    max_listeners: AtomicUsize,
    events_emitted: AtomicU64,
}

impl EventBus {
    /// Create a bus with the default listener soft limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_listeners(DEFAULT_MAX_LISTENERS)
    }

    /// Create a bus with a specific listener soft limit.
    #[must_use]
    pub fn with_max_listeners(max_listeners: usize) -> Self {
        Self {
            state: RwLock::new(BusState::default()),
            next_listener_id: AtomicU64::new(1),
            max_listeners: AtomicUsize::new(max_listeners),
            events_emitted: AtomicU64::new(0),
        }
    }

    /// Register a persistent listener for `event`.
    ///
    /// Listeners fire in registration order. Exceeding the soft limit logs a
    /// warning but never blocks registration.
    pub fn on<F>(&self, event: &str, callback: F) -> Result<ListenerId, BusError>
    where
        F: Fn(&EventData) -> ListenerResult + Send + Sync + 'static,
    {
        let id = self.next_id();
        let mut state = self.state.write();
        if state.destroyed {
            return Err(BusError::Destroyed);
        }

        let listeners = state.events.entry(event.to_string()).or_default();
        let limit = self.max_listeners.load(Ordering::Relaxed);
        if listeners.len() >= limit {
            warn!(
                event,
                count = listeners.len(),
                limit,
                "listener count exceeds soft limit"
            );
        }
        listeners.push(ListenerEntry {
            id,
            callback: Arc::new(callback),
        });
        debug!(event, listener = id.0, "listener registered");
        Ok(id)
    }

    /// Register a listener fired at most once, then discarded.
    pub fn once<F>(&self, event: &str, callback: F) -> Result<ListenerId, BusError>
    where
        F: Fn(&EventData) -> ListenerResult + Send + Sync + 'static,
    {
        let id = self.next_id();
        let mut state = self.state.write();
        if state.destroyed {
            return Err(BusError::Destroyed);
        }
        state
            .once_events
            .entry(event.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                callback: Arc::new(callback),
            });
        debug!(event, listener = id.0, "once-listener registered");
        Ok(id)
    }

    /// Emit `event` synchronously to every listener, in registration order:
    /// persistent listeners first, then the once-bucket, which is cleared
    /// afterwards.
    ///
    /// Returns the number of listeners that completed without error. A
    /// listener error is logged and never propagates to the emitter or
    /// prevents subsequent listeners from running. Emitting on a destroyed
    /// bus logs a warning and delivers to nobody.
    pub fn emit(&self, event: &str, data: EventData) -> usize {
        let middlewares = {
            let state = self.state.read();
            if state.destroyed {
                warn!(event, "emit on destroyed bus dropped");
                return 0;
            }
            state.middlewares.clone()
        };

        // Last-registered middleware wraps the rest, so it sees the event
        // first. An Err is treated as Keep (fail open).
        let mut data = data;
        for mw in middlewares.iter().rev() {
            match (mw)(event, &data) {
                Ok(MiddlewareAction::Keep) => {}
                Ok(MiddlewareAction::Replace(next)) => data = next,
                Ok(MiddlewareAction::Suppress) => {
                    debug!(event, "emission suppressed by middleware");
                    return 0;
                }
                Err(e) => {
                    error!(event, error = %e, "middleware failed, emitting original payload");
                }
            }
        }

        // Snapshot both buckets and drain the once-bucket before invoking
        // anything, so the lock is not held across callbacks.
        let (persistent, once) = {
            let mut state = self.state.write();
            if state.destroyed {
                warn!(event, "emit on destroyed bus dropped");
                return 0;
            }
            let persistent: Vec<ListenerFn> = state
                .events
                .get(event)
                .map(|entries| entries.iter().map(|e| Arc::clone(&e.callback)).collect())
                .unwrap_or_default();
            let once: Vec<ListenerFn> = state
                .once_events
                .remove(event)
                .map(|entries| entries.into_iter().map(|e| e.callback).collect())
                .unwrap_or_default();
            (persistent, once)
        };

        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        let mut executed = 0usize;
        for callback in persistent.iter().chain(once.iter()) {
            match callback(&data) {
                Ok(()) => executed += 1,
                Err(e) => {
                    error!(event, error = %e, "listener failed");
                }
            }
        }

        debug!(event, executed, "event emitted");
        executed
    }

    /// Remove every listener for `event`, both persistent and once buckets.
    pub fn off(&self, event: &str) {
        let mut state = self.state.write();
        state.events.remove(event);
        state.once_events.remove(event);
        debug!(event, "all listeners removed");
    }

    /// Remove one registration by id. Returns whether anything was removed.
    pub fn off_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let mut removed = false;
        for bucket in [&mut state.events, &mut state.once_events] {
            if let Some(entries) = bucket.get_mut(event) {
                let before = entries.len();
                entries.retain(|entry| entry.id != id);
                removed |= entries.len() != before;
                if entries.is_empty() {
                    bucket.remove(event);
                }
            }
        }
        removed
    }

    /// Install a middleware transform. Middlewares compose
    /// last-registered-wraps-previous.
    pub fn use_middleware<F>(&self, middleware: F) -> Result<(), BusError>
    where
        F: Fn(&str, &EventData) -> crate::MiddlewareResult + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        if state.destroyed {
            return Err(BusError::Destroyed);
        }
        state.middlewares.push(Arc::new(middleware));
        Ok(())
    }

    /// Scoped view prefixing every event name with `prefix:`.
    #[must_use]
    pub fn namespace(self: &Arc<Self>, prefix: &str) -> NamespacedBus {
        NamespacedBus::new(Arc::clone(self), prefix)
    }

    /// Distinct event names with at least one listener.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let state = self.state.read();
        let mut names: Vec<String> = state
            .events
            .keys()
            .chain(state.once_events.keys())
            .cloned()
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Listener registrations for `event`, both buckets.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        let state = self.state.read();
        let normal = state.events.get(event).map_or(0, Vec::len);
        let once = state.once_events.get(event).map_or(0, Vec::len);
        normal + once
    }

    /// Whether any listener is registered for `event`.
    #[must_use]
    pub fn has_listeners(&self, event: &str) -> bool {
        let state = self.state.read();
        state.events.contains_key(event) || state.once_events.contains_key(event)
    }

    /// Adjust the per-event soft listener limit.
    pub fn set_max_listeners(&self, max: usize) {
        self.max_listeners.store(max, Ordering::Relaxed);
    }

    /// Total events emitted since construction.
    #[must_use]
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    /// Snapshot of the bus tables.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        let state = self.state.read();
        let total_listeners = state.events.values().map(Vec::len).sum::<usize>()
            + state.once_events.values().map(Vec::len).sum::<usize>();
        BusStats {
            total_events: self.event_names_locked(&state),
            normal_events: state.events.len(),
            once_events: state.once_events.len(),
            total_listeners,
            max_listeners: self.max_listeners.load(Ordering::Relaxed),
        }
    }

    /// Clear every table and block further use.
    pub fn destroy(&self) {
        let mut state = self.state.write();
        state.events.clear();
        state.once_events.clear();
        state.middlewares.clear();
        state.destroyed = true;
        debug!("event bus destroyed");
    }

    /// Whether `destroy` has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.read().destroyed
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed))
    }

    fn event_names_locked(&self, state: &BusState) -> usize {
        let mut names: Vec<&String> = state
            .events
            .keys()
            .chain(state.once_events.keys())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
