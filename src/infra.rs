//! # Infrastructure Module
//!
//! This module provides infrastructure services for Testmin: subprocess
//! output capture and the settings-driven message templating used for all
//! user-facing text.

pub mod command;
pub mod messages;

pub use messages::Messages;
