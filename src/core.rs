//! # Core Module
//!
//! This module contains the core orchestration functionality of Testmin:
//! settings resolution, directory scanning, the child-process result
//! protocol, test execution and the run log models.

pub mod config;
pub mod execution;
pub mod models;
pub mod planner;
pub mod protocol;

// Re-exports
pub use config::Settings;
pub use execution::process_tests;
pub use models::RunLog;
