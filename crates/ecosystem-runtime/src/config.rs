//! # Ecosystem Configuration
//!
//! Runtime parameters plus the system/module catalogs. Defaults mirror the
//! platform's standard registry; every knob has an environment override.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HIVE_DEBUG` | `false` | Verbose lifecycle logging |
//! | `HIVE_AUTO_LOAD` | `true` | Load `auto_load` modules at startup |
//! | `HIVE_MAX_LISTENERS` | `100` | Bus listener soft limit |
//! | `HIVE_READY_TIMEOUT_SECS` | `10` | `wait_ready` default deadline |

use std::time::Duration;

use shared_bus::DEFAULT_MAX_LISTENERS;
use shared_types::{ModuleSpec, SystemSpec};

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct EcosystemConfig {
    /// Verbose lifecycle logging.
    pub debug: bool,
    /// Load `auto_load` modules at the end of startup.
    pub auto_load: bool,
    /// Bus listener soft limit per event name.
    pub max_listeners: usize,
    /// Default deadline for `wait_ready`.
    pub ready_timeout: Duration,
    /// Core systems, loaded sequentially by ascending priority.
    pub systems: Vec<SystemSpec>,
    /// Feature modules, registered as metadata and loaded on demand.
    pub modules: Vec<ModuleSpec>,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            debug: false,
            auto_load: true,
            max_listeners: DEFAULT_MAX_LISTENERS,
            ready_timeout: Duration::from_secs(10),
            systems: Vec::new(),
            modules: Vec::new(),
        }
    }
}

impl EcosystemConfig {
    /// The platform's standard catalog: wallet/template systems are
    /// load-bearing, analytics and widgets degrade, the token manager is the
    /// only auto-load module.
    #[must_use]
    pub fn platform_catalog() -> Self {
        Self {
            systems: vec![
                SystemSpec::new("wallet", "systems/wallet-system", "WalletSystem", 1).required(),
                SystemSpec::new("template", "systems/template-system", "TemplateSystem", 2)
                    .required(),
                SystemSpec::new("analytics", "systems/analytics-system", "AnalyticsSystem", 3),
                SystemSpec::new("widget", "systems/widget-system", "WidgetSystem", 4),
            ],
            modules: vec![
                ModuleSpec::new("tokens", "modules/token-manager", "TokenManager").auto_load(),
                ModuleSpec::new("profile", "modules/user-profile", "UserProfile")
                    .with_dependencies(["storage"]),
                ModuleSpec::new("settings", "modules/system-settings", "SystemSettings")
                    .with_dependencies(["storage"]),
                ModuleSpec::new("templates", "modules/template-gallery", "TemplateGallery"),
                ModuleSpec::new("analytics", "modules/analytics-reports", "AnalyticsReports"),
            ],
            ..Self::default()
        }
    }

    /// Platform catalog with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::platform_catalog();
        config.apply_env_overrides();
        config
    }

    /// Apply `HIVE_*` environment overrides to this configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("HIVE_DEBUG") {
            self.debug = parse_flag(&value);
        }
        if let Ok(value) = std::env::var("HIVE_AUTO_LOAD") {
            self.auto_load = parse_flag(&value);
        }
        if let Ok(value) = std::env::var("HIVE_MAX_LISTENERS") {
            if let Ok(max) = value.parse() {
                self.max_listeners = max;
            }
        }
        if let Ok(value) = std::env::var("HIVE_READY_TIMEOUT_SECS") {
            if let Ok(secs) = value.parse() {
                self.ready_timeout = Duration::from_secs(secs);
            }
        }
    }

    /// Systems sorted by ascending priority (stable for equal priorities).
    #[must_use]
    pub fn systems_by_priority(&self) -> Vec<SystemSpec> {
        let mut systems = self.systems.clone();
        systems.sort_by_key(|spec| spec.priority);
        systems
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
