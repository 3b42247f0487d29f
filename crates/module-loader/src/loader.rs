//! # Resource Loader Core
//!
//! Tracks loaded identifiers process-wide and coalesces concurrent loads of
//! the same identifier onto one in-flight fetch.
//!
//! ## Failure Semantics
//!
//! A failed fetch leaves the identifier's cell empty: the failure is
//! reported to every coalesced caller, and the next `load` starts a fresh
//! fetch. There is no cancellation; an abandoned load still settles the
//! cell when the underlying fetch completes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::source::UnitSource;

/// Errors from loading a code unit.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The fetch for `identifier` failed.
    #[error("failed to load unit '{identifier}': {source}")]
    Failure {
        identifier: String,
        #[source]
        source: crate::source::FetchError,
    },
}

/// Loader statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderStats {
    /// Identifiers successfully loaded.
    pub loaded: usize,
    /// Identifiers with a fetch currently in flight (or failed awaiting retry).
    pub pending: usize,
    /// Fetches actually issued to the source (coalesced calls share one).
    pub fetches: u64,
}

/// Idempotent loader of external code units by identifier.
pub struct ResourceLoader<U>
where
    U: Clone + Send + Sync + 'static,
{
    source: Arc<dyn UnitSource<U>>,
    units: Mutex<HashMap<String, Arc<OnceCell<U>>>>,
    fetches: AtomicU64,
}

impl<U> ResourceLoader<U>
where
    U: Clone + Send + Sync + 'static,
{
    /// Create a loader over a host-supplied unit source.
    pub fn new(source: Arc<dyn UnitSource<U>>) -> Self {
        Self {
            source,
            units: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Load the unit behind `identifier`.
    ///
    /// Resolves immediately when already loaded. Otherwise one fetch is
    /// issued; concurrent callers for the same identifier wait on it and
    /// receive the same unit.
    pub async fn load(&self, identifier: &str) -> Result<U, LoadError> {
        let cell = {
            let mut units = self.units.lock();
            Arc::clone(
                units
                    .entry(identifier.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        if let Some(unit) = cell.get() {
            debug!(identifier, "unit already loaded");
            return Ok(unit.clone());
        }

        let unit = cell
            .get_or_try_init(|| async {
                self.fetches.fetch_add(1, Ordering::Relaxed);
                debug!(identifier, "fetching unit");
                self.source.fetch(identifier).await
            })
            .await
            .map_err(|source| {
                warn!(identifier, error = %source, "unit fetch failed");
                LoadError::Failure {
                    identifier: identifier.to_string(),
                    source,
                }
            })?;

        Ok(unit.clone())
    }

    /// Whether `identifier` has completed loading.
    #[must_use]
    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.units
            .lock()
            .get(identifier)
            .is_some_and(|cell| cell.initialized())
    }

    /// Identifiers that have completed loading, sorted.
    #[must_use]
    pub fn loaded_identifiers(&self) -> Vec<String> {
        let units = self.units.lock();
        let mut names: Vec<String> = units
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Snapshot of the loader tables.
    #[must_use]
    pub fn stats(&self) -> LoaderStats {
        let units = self.units.lock();
        let loaded = units.values().filter(|cell| cell.initialized()).count();
        LoaderStats {
            loaded,
            pending: units.len() - loaded,
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }
}
