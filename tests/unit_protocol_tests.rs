//! Unit tests for the status-line protocol.

use serde_json::json;

use testmin::core::protocol::{last_line, parse_status};

#[test]
fn last_line_skips_trailing_blanks() {
    assert_eq!(last_line("a\nb\n\n   \n"), Some("b"));
}

#[test]
fn last_line_handles_carriage_returns() {
    assert_eq!(last_line("a\r\nb\r\n"), Some("b"));
}

#[test]
fn last_line_of_all_blank_output_is_none() {
    assert_eq!(last_line(""), None);
    assert_eq!(last_line("\n \n\t\n"), None);
}

#[test]
fn status_with_extra_fields_yields_details() {
    let stdout = "some output\n  \n{\"testmin-success\": true, \"x\": 1}\n\n";
    let status = parse_status(stdout).unwrap();

    assert!(status.success);
    assert_eq!(status.details.get("x"), Some(&json!(1)));
    assert_eq!(status.details.len(), 1);
}

#[test]
fn success_indicator_is_removed_from_details() {
    let status = parse_status("{\"testmin-success\": true}").unwrap();

    assert!(status.success);
    assert!(status.details.is_empty());
}

#[test]
fn reported_failure_parses_as_failure() {
    let status = parse_status("{\"testmin-success\": false}").unwrap();

    assert!(!status.success);
}

#[test]
fn surrounding_whitespace_on_the_line_is_tolerated() {
    let status = parse_status("  {\"testmin-success\": true}  \n").unwrap();

    assert!(status.success);
}

#[test]
fn non_json_last_line_is_a_violation() {
    assert_eq!(parse_status("all good\nnot json"), None);
}

#[test]
fn json_without_object_braces_is_a_violation() {
    // A bare JSON scalar never even reaches the parser.
    assert_eq!(parse_status("true"), None);
    assert_eq!(parse_status("[1, 2]"), None);
}

#[test]
fn malformed_object_is_a_violation() {
    assert_eq!(parse_status("{\"testmin-success\": }"), None);
}

#[test]
fn missing_success_field_is_a_violation() {
    assert_eq!(parse_status("{\"x\": 1}"), None);
}

#[test]
fn non_boolean_success_field_is_a_violation() {
    assert_eq!(parse_status("{\"testmin-success\": \"true\"}"), None);
    assert_eq!(parse_status("{\"testmin-success\": 1}"), None);
}

#[test]
fn empty_output_is_a_violation() {
    assert_eq!(parse_status(""), None);
}

#[test]
fn only_the_last_non_blank_line_counts() {
    // An earlier valid status line is shadowed by later output.
    let stdout = "{\"testmin-success\": true}\ntrailing noise\n";
    assert_eq!(parse_status(stdout), None);
}
