// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::core::config::{self, CliOverrides};

pub mod commands;

fn build_cli() -> Command {
    Command::new("testmin")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("A minimalist orchestrator for executable test files")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Discover and run the test files under a directory tree")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .help("Root directory to scan for tests")
                        .value_name("DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to the global settings override file")
                        .value_name("CONFIG")
                        .default_value(config::GLOBAL_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("submit")
                        .short('s')
                        .long("submit")
                        .help(
                            "Whether to submit the results to the collector: \
                             a truthy value submits without asking, a falsy one never asks",
                        )
                        .value_name("SUBMIT")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("silent")
                        .long("silent")
                        .help("Suppress all console output")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about("Create a starter testmin.config.json in the current directory")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help("Overwrite an existing configuration file")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help("Write the default config without launching the wizard")
                        .action(ArgAction::SetTrue),
                ),
        )
}

pub async fn run() -> Result<ExitCode> {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let dir = run_matches
                .get_one::<PathBuf>("dir")
                .unwrap() // Has default
                .clone();
            let config = run_matches
                .get_one::<PathBuf>("config")
                .unwrap() // Has default
                .clone();
            let overrides = CliOverrides {
                submit: run_matches
                    .get_one::<String>("submit")
                    .map(|value| val_to_bool(value)),
                silent: run_matches.get_flag("silent"),
            };

            let success = commands::run::execute(dir, config, overrides).await?;
            Ok(if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(("init", init_matches)) => {
            let force = init_matches.get_flag("force");
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::execute(force, non_interactive)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            // No subcommand: clap already printed the help text.
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Lenient boolean parsing for flag values: `n`, `f`, `0` or an empty
/// string (after trimming, case-insensitively, first character only) are
/// false, anything else is true.
pub fn val_to_bool(value: &str) -> bool {
    match value.trim().chars().next() {
        None => false,
        Some(c) => !matches!(c.to_ascii_lowercase(), 'n' | 'f' | '0'),
    }
}
