//! # Registration Descriptors
//!
//! Metadata records describing the loadable units of the ecosystem. These are
//! consumed as configuration by the runtime; they never hold live instances.
//!
//! ## Two Kinds of Units
//!
//! - **Systems** are loaded eagerly during a dedicated startup phase, in
//!   ascending `priority` order, before any module registration begins.
//! - **Modules** are registered as metadata first and loaded on demand, or
//!   automatically at startup when flagged `auto_load`.

use serde::{Deserialize, Serialize};

/// Descriptor for a lazily-loadable feature module.
///
/// `loaded` state is tracked by the runtime, not here; the descriptor is the
/// immutable registration half of a module's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Unique module name, used for registration and lookup.
    pub name: String,
    /// Identifier of the code unit handed to the resource loader.
    pub path: String,
    /// Constructor name expected inside the loaded unit. Checked against the
    /// unit handle at load time.
    pub class_ref: String,
    /// Load this module automatically at the end of startup.
    #[serde(default)]
    pub auto_load: bool,
    /// Names of container registrations this module consumes, resolved
    /// left-to-right into its dependency bag.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ModuleSpec {
    /// Convenience constructor for a lazy module with no declared dependencies.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        class_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            class_ref: class_ref.into(),
            auto_load: false,
            dependencies: Vec::new(),
        }
    }

    /// Flag this module for automatic loading at startup.
    #[must_use]
    pub fn auto_load(mut self) -> Self {
        self.auto_load = true;
        self
    }

    /// Declare the container registrations this module consumes.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Descriptor for a core feature system.
///
/// Systems share the module shape but are loaded unconditionally during
/// startup. A failed `required` system aborts startup; an optional system
/// degrades the ecosystem instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSpec {
    /// Unique system name.
    pub name: String,
    /// Identifier of the code unit handed to the resource loader.
    pub path: String,
    /// Constructor name expected inside the loaded unit.
    pub class_ref: String,
    /// Startup ordering; lower priorities load first.
    pub priority: u32,
    /// A failed required system is fatal to the whole startup sequence.
    #[serde(default)]
    pub required: bool,
    /// Names of container registrations this system consumes.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl SystemSpec {
    /// Convenience constructor for an optional system.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        class_ref: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            class_ref: class_ref.into(),
            priority,
            required: false,
            dependencies: Vec::new(),
        }
    }

    /// Mark this system as load-bearing for the whole ecosystem.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Declare the container registrations this system consumes.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = names.into_iter().map(Into::into).collect();
        self
    }
}
