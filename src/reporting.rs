//! # Reporting Module
//!
//! This module handles everything that leaves the orchestration core: the
//! verbosity-gated console sink and the optional submission of run results
//! to a remote collector.

pub mod console;
pub mod submit;

pub use console::Console;
