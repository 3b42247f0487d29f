//! # Ecosystem Telemetry
//!
//! Structured logging for the kernel and its modules.
//!
//! ## Components
//!
//! - [`TelemetryConfig`]: service name and filter, overridable from the
//!   environment
//! - [`init_telemetry`]: installs the global `tracing` subscriber; call once
//!   from the binary
//! - [`ScopedLogger`]: the logger handle injected into every module, tagging
//!   each record with the owning scope
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HIVE_LOG_LEVEL` | `info` | Log level filter |
//! | `HIVE_SERVICE_NAME` | `tokenhive` | Service name field |

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every record.
    pub service_name: String,
    /// Filter directive, e.g. `info` or `ecosystem_runtime=debug`.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "tokenhive".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Build the configuration with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("HIVE_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(name) = std::env::var("HIVE_SERVICE_NAME") {
            config.service_name = name;
        }
        config
    }
}

/// Install the global tracing subscriber.
///
/// Returns a guard for symmetry with heavier telemetry stacks; holding it is
/// not required for the fmt subscriber but keeps call sites future-proof.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(service = %config.service_name, "telemetry initialized");
    Ok(TelemetryGuard { _private: () })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _private: (),
}

/// Logger handle tagging every record with its owning scope.
///
/// One of these is injected into each loaded module so module logs are
/// attributable without the module knowing about the subscriber setup.
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    scope: String,
}

impl ScopedLogger {
    /// Create a logger for `scope` (typically a module or system name).
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    /// Derive a logger for a child scope: `wallet` → `wallet:network`.
    #[must_use]
    pub fn child(&self, scope: &str) -> Self {
        Self {
            scope: format!("{}:{}", self.scope, scope),
        }
    }

    /// The scope this logger tags records with.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(scope = %self.scope, "{message}");
    }

    pub fn info(&self, message: &str) {
        tracing::info!(scope = %self.scope, "{message}");
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(scope = %self.scope, "{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!(scope = %self.scope, "{message}");
    }
}
