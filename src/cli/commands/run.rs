//! # Run Command Module
//!
//! Wires one full invocation together: resolve settings once, run the
//! aggregator, print the summary and hand the finished log to the
//! submission flow.

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::core::config::{self, CliOverrides};
use crate::core::execution::process_tests;
use crate::infra::messages::Messages;
use crate::reporting::console::{self, Console};
use crate::reporting::submit::submit_results;

/// Executes the run command. Returns the run's overall success so the
/// caller can map it to an exit code.
pub async fn execute(dir: PathBuf, config: PathBuf, overrides: CliOverrides) -> Result<bool> {
    let settings = config::resolve(&config, &overrides)?;
    let console = Console::new(settings.silent);
    let messages = Messages::new(&settings);

    let mut log = process_tests(&dir, &settings, &console, &messages).await;

    console::print_run_summary(&console, log.success, &messages);

    // A submission failure must not corrupt or lose the accumulated log,
    // and it does not change the run's outcome.
    if let Err(e) = submit_results(&mut log, &settings, &messages, &console).await {
        eprintln!("{} {e:#}", "submission failed:".red());
    }

    Ok(log.success)
}
