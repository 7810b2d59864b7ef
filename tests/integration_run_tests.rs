//! End-to-end tests for the run aggregator, driving real subprocesses
//! through temporary test trees.

#![cfg(unix)]

mod common;

use serde_json::json;

use testmin::core::config::Settings;
use testmin::core::execution::{self, process_tests};
use testmin::infra::messages::Messages;
use testmin::reporting::console::Console;

fn quiet() -> (Settings, Console, Messages) {
    let settings = common::test_settings();
    let console = Console::new(true);
    let messages = Messages::new(&settings);
    (settings, console, messages)
}

#[tokio::test]
async fn passing_tree_succeeds() {
    let tree = common::setup_tree();
    common::write_script(tree.path(), "root-check", common::PASS_SCRIPT);
    let sub = common::make_subdir(tree.path(), "sub");
    common::write_script(&sub, "sub-check", common::PASS_SCRIPT);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(log.success);
    assert_eq!(log.dirs.keys().collect::<Vec<_>>(), vec![".", "sub"]);
    let root = log.dirs.get(".").unwrap();
    assert_eq!(root.files_run, 1);
    assert!(root.files.get("root-check").unwrap().success);
    assert!(log.run_time > 0.0);
}

#[tokio::test]
async fn first_failing_directory_stops_the_run() {
    let tree = common::setup_tree();
    let a = common::make_subdir(tree.path(), "a");
    let b = common::make_subdir(tree.path(), "b");
    common::write_script(&a, "boom", common::FAIL_SCRIPT);
    common::write_script(&b, "fine", common::PASS_SCRIPT);
    common::write_dir_settings(&a, r#"{"dir-order": 1}"#);
    common::write_dir_settings(&b, r#"{"dir-order": 2}"#);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(!log.success);
    // The later directory is never reached and never logged.
    assert_eq!(log.dirs.keys().collect::<Vec<_>>(), vec![".", "a"]);
    let failed = log.dirs.get("a").unwrap().files.get("boom").unwrap();
    assert!(!failed.success);
    assert_eq!(failed.stderr.as_deref(), Some("oh no\n"));
}

#[tokio::test]
async fn failure_stops_later_files_in_the_same_directory() {
    let tree = common::setup_tree();
    let sub = common::make_subdir(tree.path(), "sub");
    common::write_script(&sub, "f1", common::FAIL_SCRIPT);
    common::write_script(&sub, "f2", common::PASS_SCRIPT);
    common::write_dir_settings(&sub, r#"{"files": {"f1": {}, "f2": {}}}"#);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(!log.success);
    let dir = log.dirs.get("sub").unwrap();
    assert_eq!(dir.files_run, 1);
    assert!(dir.files.get("f1").is_some());
    assert!(dir.files.get("f2").is_none());
}

#[tokio::test]
async fn timed_out_file_is_killed_and_marked() {
    let tree = common::setup_tree();
    let sub = common::make_subdir(tree.path(), "sub");
    common::write_script(&sub, "sleeper", common::SLEEP_SCRIPT);
    common::write_script(&sub, "after", common::PASS_SCRIPT);
    common::write_dir_settings(
        &sub,
        r#"{"files": {"sleeper": {"timeout": 1}, "after": {}}}"#,
    );

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(!log.success);
    let dir = log.dirs.get("sub").unwrap();
    let sleeper = dir.files.get("sleeper").unwrap();
    assert!(!sleeper.success);
    assert_eq!(sleeper.timed_out, Some(1));
    // Killed at the deadline, well before the script's own sleep ends.
    assert!(sleeper.run_time >= 1.0 && sleeper.run_time < 4.0);
    assert!(dir.files.get("after").is_none());
}

#[tokio::test]
async fn disabled_file_is_never_executed_or_counted() {
    let tree = common::setup_tree();
    let sub = common::make_subdir(tree.path(), "sub");
    // Would fail the run if it were ever executed.
    common::write_script(&sub, "off", common::FAIL_SCRIPT);
    common::write_script(&sub, "on", common::PASS_SCRIPT);
    common::write_dir_settings(&sub, r#"{"files": {"off": false, "on": {}}}"#);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(log.success);
    let dir = log.dirs.get("sub").unwrap();
    assert_eq!(dir.files_run, 1);
    assert!(dir.files.get("off").is_none());
    assert!(dir.files.get("on").unwrap().success);
}

#[tokio::test]
async fn skipped_directory_runs_nothing() {
    let tree = common::setup_tree();
    let sub = common::make_subdir(tree.path(), "sub");
    common::write_script(&sub, "boom", common::FAIL_SCRIPT);
    common::write_dir_settings(&sub, r#"{"skip": true}"#);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(log.success);
    let dir = log.dirs.get("sub").unwrap();
    assert!(dir.skipped);
    assert_eq!(dir.files_run, 0);
    assert!(dir.files.is_empty());
}

#[tokio::test]
async fn scan_fault_fails_the_run_with_a_recorded_error() {
    let tree = common::setup_tree();
    let sub = common::make_subdir(tree.path(), "sub");
    common::write_dir_settings(&sub, "{ broken");

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(!log.success);
    assert!(log.dirs.is_empty());
    assert_eq!(log.errors.len(), 1);
    assert_eq!(log.errors[0].id, "testmin.dir.json-parse-error");
}

#[tokio::test]
async fn status_line_details_reach_the_log() {
    let tree = common::setup_tree();
    common::write_script(tree.path(), "detailed", common::DETAILS_SCRIPT);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(log.success);
    let file = log.dirs.get(".").unwrap().files.get("detailed").unwrap();
    let details = file.details.as_ref().unwrap();
    assert_eq!(details.get("x"), Some(&json!(1)));
}

#[tokio::test]
async fn missing_status_line_fails_with_output_attached() {
    let tree = common::setup_tree();
    common::write_script(tree.path(), "mute", common::NO_STATUS_SCRIPT);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(!log.success);
    let file = log.dirs.get(".").unwrap().files.get("mute").unwrap();
    assert!(!file.success);
    assert!(file.details.is_none());
    assert_eq!(file.stdout.as_deref(), Some("just noise\n"));
}

#[tokio::test]
async fn children_receive_the_run_environment() {
    let tree = common::setup_tree();
    let script = concat!(
        "#!/bin/sh\n",
        "if [ -n \"$TESTMIN_RUN_ID\" ] && [ -n \"$TESTMIN_VERSION\" ]; then\n",
        "  echo '{\"testmin-success\": true}'\n",
        "else\n",
        "  echo '{\"testmin-success\": false}'\n",
        "fi\n",
    );
    common::write_script(tree.path(), "env-check", script);

    let (settings, console, messages) = quiet();
    let log = process_tests(tree.path(), &settings, &console, &messages).await;

    assert!(log.success);
}

#[tokio::test]
async fn launch_failure_fails_the_file_not_the_runner() {
    let tree = common::setup_tree();

    let outcome = execution::run_file(tree.path(), "no-such-file", 30, &[]).await;

    assert!(!outcome.success);
    assert!(outcome.stderr.contains("failed to launch"));
    assert!(outcome.timed_out.is_none());
}

#[tokio::test]
async fn invalid_utf8_output_does_not_hide_the_status_line() {
    let tree = common::setup_tree();
    // Raw 0xFF 0xFE bytes ahead of a valid trailing status line.
    let script = "#!/bin/sh\nprintf '\\377\\376\\n'\necho '{\"testmin-success\": true}'\n";
    common::write_script(tree.path(), "binary-noise", script);

    let outcome = execution::run_file(tree.path(), "binary-noise", 30, &[]).await;

    assert!(outcome.success);
    assert!(outcome.stdout.contains("{\"testmin-success\": true}"));
}

#[tokio::test]
async fn invalid_utf8_is_replaced_not_dropped_in_failure_diagnostics() {
    let tree = common::setup_tree();
    let script =
        "#!/bin/sh\nprintf 'garbled \\377 here\\n'\necho '{\"testmin-success\": false}'\n";
    common::write_script(tree.path(), "garbled", script);

    let outcome = execution::run_file(tree.path(), "garbled", 30, &[]).await;

    assert!(!outcome.success);
    assert!(outcome.stdout.contains("garbled"));
    assert!(outcome.stdout.contains('\u{FFFD}'));
}

#[tokio::test]
async fn exit_status_is_ignored_in_favor_of_the_status_line() {
    let tree = common::setup_tree();
    let script = "#!/bin/sh\necho '{\"testmin-success\": true}'\nexit 3\n";
    common::write_script(tree.path(), "bad-exit", script);

    let outcome = execution::run_file(tree.path(), "bad-exit", 30, &[]).await;

    assert!(outcome.success);
}
