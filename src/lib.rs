//! # Testmin Library
//!
//! This library provides the core functionality for Testmin, a minimalist,
//! configuration-driven orchestrator for executable test files. Each test is
//! an opaque executable; the only contract between the runner and a test is
//! a one-line JSON status object printed as the last non-blank line of the
//! test's standard output.
//!
//! ## Modules
//!
//! - `core` - Settings resolution, directory scanning, test execution and
//!   the run log models
//! - `infra` - Infrastructure services like subprocess output capture and
//!   message templating
//! - `reporting` - Console output and result submission
//! - `cli` - Command-line interface and commands

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use self::core::config;
pub use self::core::execution;
pub use self::core::models;
