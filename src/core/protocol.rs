//! # Result Protocol Module
//!
//! A test executable reports its result by printing, as the last non-blank
//! line of its standard output, a JSON object containing the boolean
//! `testmin-success` field. Any other fields in that object are surfaced
//! as diagnostic details. Anything else - no such line, unparseable JSON,
//! a missing or non-boolean success field - is a protocol violation and
//! counts as failure with no structured details.
//!
//! This is the system's actual wire format for child results, deliberately
//! language-neutral: a line-reverse scan plus a standard JSON parser, not
//! a framing layer.

use serde_json::{Map, Value};

/// The required success indicator field of a status line.
pub const SUCCESS_KEY: &str = "testmin-success";

/// A successfully parsed status line.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub success: bool,
    /// Every status-line field other than the success indicator.
    pub details: Map<String, Value>,
}

/// Returns the last line of `text` containing any non-whitespace
/// character, or `None` if there is no such line.
pub fn last_line(text: &str) -> Option<&str> {
    text.split(['\n', '\r'])
        .rev()
        .find(|line| line.chars().any(|c| !c.is_whitespace()))
}

/// Extracts and validates the status line from a test's standard output.
pub fn parse_status(stdout: &str) -> Option<Status> {
    let line = last_line(stdout)?.trim();
    if !(line.starts_with('{') && line.ends_with('}')) {
        return None;
    }

    let Ok(Value::Object(mut fields)) = serde_json::from_str::<Value>(line) else {
        return None;
    };

    match fields.remove(SUCCESS_KEY) {
        Some(Value::Bool(success)) => Some(Status {
            success,
            details: fields,
        }),
        _ => None,
    }
}
