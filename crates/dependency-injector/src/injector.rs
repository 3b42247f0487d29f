//! # The Container
//!
//! Registration and singleton tables live behind one mutex; a whole
//! resolution (including recursive dependency resolution and factory
//! invocation) runs under it. Factories therefore receive their resolved
//! bag and must not call back into the container.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{InjectorError, ValidationIssue};
use crate::provider::{Instance, Provider, RegisterOptions, ResolvedDeps};

#[derive(Clone)]
struct Registration {
    provider: Provider,
    singleton: bool,
    dependencies: Vec<String>,
    lazy: bool,
}

#[derive(Default)]
struct InjectorState {
    registrations: HashMap<String, Registration>,
    singletons: HashMap<String, Instance>,
    /// Names currently on the resolution stack, in entry order. Used for
    /// cycle detection and for reporting the cycle path.
    resolving: Vec<String>,
}

/// Container statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectorStats {
    /// Registered names.
    pub registrations: usize,
    /// Cached singleton instances.
    pub singletons: usize,
    /// Depth of the in-progress resolution stack (0 between calls).
    pub resolving: usize,
}

/// IoC registry resolving named providers into shared instances.
pub struct DependencyInjector {
    state: Mutex<InjectorState>,
}

impl DependencyInjector {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InjectorState::default()),
        }
    }

    /// Register a provider under `name`.
    ///
    /// Fails with `DuplicateRegistration` when the name exists and with
    /// `InvalidProvider` when a plain value declares dependencies.
    pub fn register(
        &self,
        name: &str,
        provider: Provider,
        options: RegisterOptions,
    ) -> Result<(), InjectorError> {
        if provider.is_value() && !options.dependencies.is_empty() {
            return Err(InjectorError::InvalidProvider(name.to_string()));
        }

        let mut state = self.state.lock();
        if state.registrations.contains_key(name) {
            return Err(InjectorError::DuplicateRegistration(name.to_string()));
        }
        state.registrations.insert(
            name.to_string(),
            Registration {
                provider,
                singleton: options.singleton,
                dependencies: options.dependencies,
                lazy: options.lazy,
            },
        );
        debug!(name, "dependency registered");
        Ok(())
    }

    /// Register a memoized factory.
    pub fn singleton(&self, name: &str, provider: Provider) -> Result<(), InjectorError> {
        self.register(name, provider, RegisterOptions::singleton())
    }

    /// Register an already-constructed shared value (always a singleton).
    pub fn value(&self, name: &str, instance: Instance) -> Result<(), InjectorError> {
        self.register(name, Provider::shared(instance), RegisterOptions::singleton())
    }

    /// Resolve `name` into an instance.
    ///
    /// Cached singletons return immediately. Otherwise the declared
    /// dependencies are resolved left-to-right into a bag, the provider is
    /// invoked, and singleton results are cached before returning.
    pub fn resolve(&self, name: &str) -> Result<Instance, InjectorError> {
        let mut state = self.state.lock();
        Self::resolve_locked(&mut state, name)
    }

    /// Typed resolve; fails with `TypeMismatch` when the instance is not `T`.
    pub fn resolve_as<T: std::any::Any + Send + Sync>(
        &self,
        name: &str,
    ) -> Result<std::sync::Arc<T>, InjectorError> {
        self.resolve(name)?
            .downcast::<T>()
            .map_err(|_| InjectorError::TypeMismatch(name.to_string()))
    }

    /// Resolve every name into one bag; any single failure fails the whole
    /// call with no partial result.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<ResolvedDeps, InjectorError> {
        let mut state = self.state.lock();
        let mut bag = ResolvedDeps::default();
        for name in names {
            let name = name.as_ref();
            let instance = Self::resolve_locked(&mut state, name)?;
            bag.insert(name.to_string(), instance);
        }
        Ok(bag)
    }

    /// New container whose registration and singleton tables are copied from
    /// this one at creation time. Later registrations diverge.
    #[must_use]
    pub fn create_child(&self) -> DependencyInjector {
        let state = self.state.lock();
        DependencyInjector {
            state: Mutex::new(InjectorState {
                registrations: state.registrations.clone(),
                singletons: state.singletons.clone(),
                resolving: Vec::new(),
            }),
        }
    }

    /// Diagnostics pass: report every cycle and dangling dependency without
    /// failing. Distinct from the fail-fast behavior of `resolve`.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let state = self.state.lock();
        let mut issues = Vec::new();

        let mut names: Vec<&String> = state.registrations.keys().collect();
        names.sort_unstable();

        for name in names {
            let registration = &state.registrations[name];
            for dependency in &registration.dependencies {
                if !state.registrations.contains_key(dependency)
                    && !state.singletons.contains_key(dependency)
                {
                    issues.push(ValidationIssue::MissingDependency {
                        name: name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }

            let mut stack = Vec::new();
            if let Some(path) = Self::find_cycle(&state.registrations, name, &mut stack) {
                issues.push(ValidationIssue::CircularDependency {
                    name: name.clone(),
                    path,
                });
            }
        }

        issues
    }

    /// Eagerly resolve every non-lazy singleton registration, returning
    /// per-name failures. Lazy registrations are deferred to first use.
    pub fn warm(&self) -> Vec<(String, InjectorError)> {
        let eager: Vec<String> = {
            let state = self.state.lock();
            let mut names: Vec<String> = state
                .registrations
                .iter()
                .filter(|(_, reg)| reg.singleton && !reg.lazy)
                .map(|(name, _)| name.clone())
                .collect();
            names.sort_unstable();
            names
        };

        let mut failures = Vec::new();
        for name in eager {
            if let Err(e) = self.resolve(&name) {
                warn!(name = %name, error = %e, "eager singleton warm-up failed");
                failures.push((name, e));
            }
        }
        failures
    }

    /// Whether `name` is registered or cached.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        let state = self.state.lock();
        state.registrations.contains_key(name) || state.singletons.contains_key(name)
    }

    /// Remove a registration and any cached singleton for `name`.
    pub fn remove(&self, name: &str) {
        let mut state = self.state.lock();
        state.registrations.remove(name);
        state.singletons.remove(name);
        debug!(name, "dependency removed");
    }

    /// Remove every registration and cached instance.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.registrations.clear();
        state.singletons.clear();
        state.resolving.clear();
        debug!("all dependencies removed");
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().registrations.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Names with cached singleton instances, sorted.
    #[must_use]
    pub fn cached_singletons(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().singletons.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Snapshot of the container tables.
    #[must_use]
    pub fn stats(&self) -> InjectorStats {
        let state = self.state.lock();
        InjectorStats {
            registrations: state.registrations.len(),
            singletons: state.singletons.len(),
            resolving: state.resolving.len(),
        }
    }

    fn resolve_locked(state: &mut InjectorState, name: &str) -> Result<Instance, InjectorError> {
        if let Some(cached) = state.singletons.get(name) {
            return Ok(std::sync::Arc::clone(cached));
        }

        if let Some(position) = state.resolving.iter().position(|n| n == name) {
            let mut path: Vec<String> = state.resolving[position..].to_vec();
            path.push(name.to_string());
            // Unwinding pops the rest of the stack at each recursion level.
            return Err(InjectorError::CircularDependency { path });
        }

        let registration = state
            .registrations
            .get(name)
            .cloned()
            .ok_or_else(|| InjectorError::NotFound(name.to_string()))?;

        state.resolving.push(name.to_string());
        let produced = Self::produce(state, name, &registration);
        state.resolving.pop();

        let instance = produced?;
        if registration.singleton {
            state
                .singletons
                .insert(name.to_string(), std::sync::Arc::clone(&instance));
        }
        debug!(name, "dependency resolved");
        Ok(instance)
    }

    fn produce(
        state: &mut InjectorState,
        name: &str,
        registration: &Registration,
    ) -> Result<Instance, InjectorError> {
        let mut bag = ResolvedDeps::default();
        for dependency in &registration.dependencies {
            let instance = Self::resolve_locked(state, dependency)?;
            bag.insert(dependency.clone(), instance);
        }

        match &registration.provider {
            Provider::Value(instance) => Ok(std::sync::Arc::clone(instance)),
            Provider::Factory(factory) => {
                factory(&bag).map_err(|source| InjectorError::FactoryFailure {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }

    fn find_cycle(
        registrations: &HashMap<String, Registration>,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        if stack.iter().any(|n| n == name) {
            let mut path = stack.clone();
            path.push(name.to_string());
            return Some(path);
        }
        let registration = registrations.get(name)?;

        stack.push(name.to_string());
        for dependency in &registration.dependencies {
            if let Some(path) = Self::find_cycle(registrations, dependency, stack) {
                stack.pop();
                return Some(path);
            }
        }
        stack.pop();
        None
    }
}

impl Default for DependencyInjector {
    fn default() -> Self {
        Self::new()
    }
}
