//! # TokenHive Kernel Test Suite
//!
//! Unified test crate covering cross-crate behavior the per-crate unit
//! tests cannot see.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── startup.rs         # end-to-end init sequencing and readiness
//!     ├── module_loading.rs  # on-demand loading, coalescing, retries
//!     └── kernel_properties.rs  # bus/container invariants through the app
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ecosystem-tests
//!
//! # By category
//! cargo test -p ecosystem-tests integration::startup::
//! cargo test -p ecosystem-tests integration::module_loading::
//! ```

#[cfg(test)]
mod integration;
