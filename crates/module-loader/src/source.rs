//! # Unit Sources
//!
//! A unit source maps a path identifier to a freshly fetched unit. The host
//! supplies the source (a script tag injector in a browser build, a dynamic
//! library in a native one); the kernel ships an in-memory source for the
//! built-in catalog and for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

/// Error produced by a failing fetch.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Host-supplied fetcher for code units.
///
/// The unit is returned directly from the fetch, so the caller never has to
/// look anything up in a shared namespace afterwards.
#[async_trait]
pub trait UnitSource<U>: Send + Sync
where
    U: Clone + Send + Sync + 'static,
{
    /// Fetch the unit behind `identifier`.
    async fn fetch(&self, identifier: &str) -> Result<U, FetchError>;
}

type UnitFactory<U> = Arc<dyn Fn() -> Result<U, FetchError> + Send + Sync>;

/// Registry-backed source mapping identifiers to unit factories.
///
/// Factories may be registered to fail, which is how tests and degraded
/// hosts model an unreachable unit.
pub struct InMemoryUnitSource<U>
where
    U: Clone + Send + Sync + 'static,
{
    units: RwLock<HashMap<String, UnitFactory<U>>>,
}

impl<U> InMemoryUnitSource<U>
where
    U: Clone + Send + Sync + 'static,
{
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory for `identifier`, replacing any previous one.
    pub fn insert<F>(&self, identifier: &str, factory: F)
    where
        F: Fn() -> Result<U, FetchError> + Send + Sync + 'static,
    {
        self.units
            .write()
            .insert(identifier.to_string(), Arc::new(factory));
    }

    /// Register an identifier whose fetch always fails with `message`.
    pub fn insert_failing(&self, identifier: &str, message: &str) {
        let message = message.to_string();
        self.insert(identifier, move || Err(message.clone().into()));
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl<U> Default for InMemoryUnitSource<U>
where
    U: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<U> UnitSource<U> for InMemoryUnitSource<U>
where
    U: Clone + Send + Sync + 'static,
{
    async fn fetch(&self, identifier: &str) -> Result<U, FetchError> {
        let factory = self
            .units
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| format!("unknown unit identifier '{identifier}'"))?;
        factory()
    }
}
