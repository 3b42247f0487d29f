//! # Dependency Injector - IoC Container for the Ecosystem
//!
//! Resolves a named dependency graph into concrete instances, enforcing a
//! DAG. Factories declare the registrations they consume by name and receive
//! them as a resolved bag; singletons are memoized on first resolution.
//!
//! ## Resolution Rules
//!
//! - Dependency lists resolve left-to-right as declared, so factory side
//!   effects are ordered deterministically
//! - A cycle anywhere in the graph fails resolution with the cycle path;
//!   the tracking state is unwound on success and failure alike
//! - Factories receive their dependency bag, never the container itself

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod error;
pub mod injector;
pub mod provider;

// Re-export main types
pub use error::{InjectorError, ValidationIssue};
pub use injector::{DependencyInjector, InjectorStats};
pub use provider::{FactoryError, Instance, Provider, RegisterOptions, ResolvedDeps};
