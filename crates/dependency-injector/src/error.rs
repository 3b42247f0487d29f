//! # Injector Errors and Validation Issues
//!
//! Registration misuse surfaces immediately to the caller of `register`;
//! resolution failures surface to the caller of `resolve` and are never
//! silently swallowed. `validate` reports issues without failing.

use thiserror::Error;

use crate::provider::FactoryError;

/// Errors from registration and resolution.
#[derive(Debug, Error)]
pub enum InjectorError {
    /// The name is already registered; remove it first to replace.
    #[error("dependency '{0}' is already registered")]
    DuplicateRegistration(String),

    /// A plain-value provider declared a dependency list it cannot consume.
    #[error("value provider '{0}' cannot declare dependencies")]
    InvalidProvider(String),

    /// No registration under this name.
    #[error("dependency '{0}' not found")]
    NotFound(String),

    /// Resolution re-entered a name already being resolved.
    #[error("circular dependency detected: {}", path.join(" -> "))]
    CircularDependency {
        /// The cycle, starting and ending at the re-entered name.
        path: Vec<String>,
    },

    /// The factory for this registration failed.
    #[error("failed to resolve dependency '{name}': {source}")]
    FactoryFailure {
        name: String,
        #[source]
        source: FactoryError,
    },

    /// The resolved instance is not of the requested type.
    #[error("dependency '{0}' resolved to an unexpected type")]
    TypeMismatch(String),
}

/// A problem found by the non-failing `validate` diagnostics pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A registration participates in a cycle.
    CircularDependency {
        name: String,
        path: Vec<String>,
    },
    /// A registration names a dependency that does not exist.
    MissingDependency {
        name: String,
        dependency: String,
    },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircularDependency { name, path } => {
                write!(f, "circular dependency at '{}': {}", name, path.join(" -> "))
            }
            Self::MissingDependency { name, dependency } => {
                write!(f, "dependency '{dependency}' not found for '{name}'")
            }
        }
    }
}
