//! # Test Execution Engine Module
//!
//! This module provides the process runner for a single test file and the
//! run aggregator that drives a whole invocation.
//!
//! Execution is strictly sequential across directories and across files
//! within a directory: log ordering and the first-failure short-circuit
//! are observable semantics, not an optimization target. The only
//! concurrency is inside [`run_file`], where the child process runs while
//! the parent races its completion against the timeout.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::core::models::{self, DirLog, FileConfig, FileLog, FileOutcome, RunError, RunLog};
use crate::core::planner::{self, DirDescriptor};
use crate::core::protocol;
use crate::core::config::Settings;
use crate::infra::command;
use crate::infra::messages::Messages;
use crate::reporting::console::Console;

/// Environment variable carrying the run-scoped random identifier, so a
/// test can tell which invocation launched it. A convention, not a
/// protocol requirement.
pub const RUN_ID_ENV: &str = "TESTMIN_RUN_ID";

/// Environment variable carrying the runner's version.
pub const VERSION_ENV: &str = "TESTMIN_VERSION";

/// Runs one test file as a subprocess and reports its outcome.
///
/// Standard output and error are captured via pipes; no standard input is
/// provided. With `timeout_secs == 0` the wait is unbounded; otherwise the
/// child's completion races the deadline and on expiry the process is
/// killed immediately, with no grace period. The exit status is ignored:
/// success is decided solely by the status line protocol.
pub async fn run_file(
    dir: &Path,
    file_name: &str,
    timeout_secs: u64,
    run_env: &[(String, String)],
) -> FileOutcome {
    let program = dir.join(file_name);
    let mut cmd = Command::new(&program);
    cmd.current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in run_env {
        cmd.env(key, value);
    }

    let started = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            // Launch failure (vanished file, revoked permission) fails
            // this file, never the orchestrator.
            return FileOutcome {
                success: false,
                stdout: String::new(),
                stderr: format!("failed to launch {}: {}", program.display(), e),
                elapsed: started.elapsed(),
                timed_out: None,
                details: None,
            };
        }
    };

    let (stdout_task, stderr_task) = command::capture_streams(&mut child);

    let timed_out = if timeout_secs == 0 {
        let _ = child.wait().await;
        None
    } else {
        match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
            Ok(_) => None,
            Err(_) => {
                let _ = child.kill().await;
                Some(timeout_secs)
            }
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();
    let elapsed = started.elapsed();

    if timed_out.is_some() {
        return FileOutcome {
            success: false,
            stdout,
            stderr,
            elapsed,
            timed_out,
            details: None,
        };
    }

    match protocol::parse_status(&stdout) {
        Some(status) => {
            let details = if status.details.is_empty() {
                None
            } else {
                Some(status.details)
            };
            FileOutcome {
                success: status.success,
                stdout,
                stderr,
                elapsed,
                timed_out: None,
                details,
            }
        }
        // Protocol violation: no status line.
        None => FileOutcome {
            success: false,
            stdout,
            stderr,
            elapsed,
            timed_out: None,
            details: None,
        },
    }
}

/// Drives one full invocation and returns its log; the sole writer of the
/// [`RunLog`]. Overall success is `log.success`.
pub async fn process_tests(
    root: &Path,
    settings: &Settings,
    console: &Console,
    messages: &Messages,
) -> RunLog {
    let mut log = RunLog::new(settings);
    let run_env = vec![
        (RUN_ID_ENV.to_string(), models::random_id(8)),
        (VERSION_ENV.to_string(), models::VERSION.to_string()),
    ];

    let run_started = Instant::now();

    let dirs = match planner::scan(root, settings) {
        Ok(dirs) => dirs,
        Err(e) => {
            console.say(&e.to_string());
            log.errors.push(RunError::from(&e));
            log.success = false;
            log.run_time = run_started.elapsed().as_secs_f64();
            return log;
        }
    };

    for (index, dir) in dirs.iter().enumerate() {
        let dir_order = index as u64 + 1;
        console.hr_titled('=', dir.heading());

        let (dir_log, dir_success) = run_dir(dir, dir_order, console, messages, &run_env).await;
        log.dirs.insert(dir.display_name.clone(), dir_log);

        if !dir_success {
            log.success = false;
            break;
        }
    }

    log.run_time = run_started.elapsed().as_secs_f64();
    log
}

/// Runs every enabled file of one directory in order, stopping at the
/// first failure. Returns the directory's log and whether it stayed
/// clean.
async fn run_dir(
    dir: &DirDescriptor,
    dir_order: u64,
    console: &Console,
    messages: &Messages,
    run_env: &[(String, String)],
) -> (DirLog, bool) {
    let mut dir_log = DirLog::new(dir_order);

    if dir.skip {
        dir_log.skipped = true;
        console.say("*** skipping ***");
        console.blank();
        return (dir_log, true);
    }

    let dir_started = Instant::now();
    let mut file_order = 0u64;

    for (name, config) in &dir.files {
        let FileConfig::Enabled { timeout } = config else {
            // Disabled files are never executed and never counted.
            continue;
        };

        file_order += 1;
        console.say(name);

        let outcome = run_file(&dir.path, name, *timeout, run_env).await;
        let success = outcome.success;

        if !success {
            print_failure(console, messages, &outcome);
        }

        dir_log.files.insert(name.clone(), FileLog::from_outcome(file_order, outcome));
        dir_log.files_run = file_order;

        if !success {
            dir_log.run_time = dir_started.elapsed().as_secs_f64();
            return (dir_log, false);
        }
    }

    dir_log.files_run = file_order;
    dir_log.run_time = dir_started.elapsed().as_secs_f64();
    console.blank();

    (dir_log, true)
}

/// Shows a failed file's captured output between rules for diagnosis.
fn print_failure(console: &Console, messages: &Messages, outcome: &FileOutcome) {
    console.blank();
    console.hr_titled('*', &messages.get("failure"));
    console.hr_titled('-', "stdout");
    console.say(&outcome.stdout);
    console.hr_titled('-', "stderr");
    console.say(&outcome.stderr);
    console.hr('*');
    console.blank();
}
