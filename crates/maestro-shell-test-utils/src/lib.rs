#![deny(unsafe_code)]

//! Shared test utilities for the maestro-shell workspace.
//!
//! Provides a scriptable [`daemon::FakeDaemon`], config builders, and tracing
//! helpers so that individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! maestro-shell-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod daemon;
pub mod tracing_setup;

pub use daemon::{FakeDaemon, RecordedRequest};
