//! # Shared Types Crate
//!
//! This crate contains the registration descriptors and lifecycle event
//! contracts shared across the kernel crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every shape that crosses a crate boundary as
//!   configuration or as an event payload is defined here.
//! - **Descriptors are metadata**: a descriptor never holds a live instance;
//!   instances are owned by the runtime that loaded them.
//! - **Leaf crate**: no dependency on any other kernel crate, so every crate
//!   can consume these types without cycles.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod descriptor;
pub mod events;

pub use descriptor::{ModuleSpec, SystemSpec};
pub use events::{
    EcosystemFault, ModuleFailed, ModuleLoaded, ModuleRegistered, StateChanged, SystemFailed,
};
