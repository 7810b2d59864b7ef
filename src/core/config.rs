//! # Settings Resolution Module
//!
//! Effective settings for a run are built by deep-merging an optional
//! on-disk override file onto the compiled-in defaults and decoding the
//! result into a typed [`Settings`] value. Resolution happens exactly once
//! per run; the value is then passed by reference into every other
//! component, which never recomputes or caches it on its own.

use colored::Colorize;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;

/// Well-known relative path of the global settings override file.
pub const GLOBAL_CONFIG_FILE: &str = "testmin.config.json";

/// Compiled-in default settings. The `messages` block is the template
/// mapping consumed by [`crate::infra::messages::Messages`], keyed by
/// language code then message id.
static DEFAULT_SETTINGS: Lazy<Value> = Lazy::new(|| {
    json!({
        // set to 0 for no timeout
        "timeout": 30,

        "submit": {
            "request": false,
            "email": false,
            "comments": false,

            "site": {
                "root": "https://testmin.idocs.com",
                "submit": "/submit",
                "project": "/project",
                "entry": "/entry",
                "title": "Idocs Testmin",
            },
        },

        "messages": {
            // English
            "en": {
                // general purpose messages
                "success": "success",
                "failure": "failure",

                // messages about test results
                "test-success": "All tests run successfully",
                "test-failure": "There were some errors in the tests",
                "finished-testing": "finished testing",

                // submit messages
                "email-prompt": "email address",
                "submit-hold": "Submitting...",
                "submit-success": "Test results successfully submitted.",
                "submit-failure": "Submission of test results failed. Errors: [[errors]]",
                "add-comments": "Add your comments here.",

                // request to submit results
                "submit-request": "May this script submit these test results to [[title]]? \
                    The results will be submitted to the [[title]] service where they will be \
                    publicly available. In addition to the test results, the only information \
                    about your system will be the operating system and version, the version of \
                    Rust that built the runner, and the version of Testmin.",

                // request to add email address
                "email-request": "Would you like to send your email address? Your email will \
                    not be publicly displayed. You will only be contacted about this project.",

                // request to add comments
                "comments-request": "Would you like to add some comments? Your comments will \
                    not be publicly displayed.",
            },

            // Spanish
            // One message so the language fallback chain has something to
            // exercise. Translations welcome.
            "es": {
                "submit-request": "¿Envíe estos resultados de la prueba a [[title]]?",
            },
        },
    })
});

/// Remote collector coordinates for result submission.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSettings {
    pub root: String,
    pub submit: String,
    pub project: String,
    pub entry: String,
    pub title: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            root: "https://testmin.idocs.com".to_string(),
            submit: "/submit".to_string(),
            project: "/project".to_string(),
            entry: "/entry".to_string(),
            title: "Idocs Testmin".to_string(),
        }
    }
}

/// Submission policy: whether the user should be asked to submit results,
/// and what extra data the submission flow may request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmitSettings {
    pub request: bool,
    pub email: bool,
    pub comments: bool,
    pub site: SiteSettings,
}

/// Effective settings for one run, decoded from the merged configuration.
///
/// `auto_submit` and `silent` are settable only from command-line flags;
/// any occurrence in the on-disk override is stripped before decoding.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Per-file timeout in seconds. Zero means no timeout.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub submit: SubmitSettings,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Message templates, keyed by language code then message id.
    #[serde(default)]
    pub messages: Map<String, Value>,
    #[serde(skip)]
    pub auto_submit: bool,
    #[serde(skip)]
    pub silent: bool,
}

fn default_timeout() -> u64 {
    30
}

/// Settings that may only come from command-line flags, never from the
/// on-disk override file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `Some(true)` submits without asking; `Some(false)` never asks.
    pub submit: Option<bool>,
    /// Suppress all console output.
    pub silent: bool,
}

/// Resolves the effective settings for a run.
///
/// Starts from the compiled-in defaults, deep-merges the override file at
/// `config_path` if it exists, strips the CLI-only keys and applies the
/// command-line overrides. An unreadable or unparseable override file is
/// ignored, and an override whose merged result does not decode (say, a
/// string where a number belongs) is dropped with a warning; only
/// per-directory settings files are load-bearing enough to fail a run
/// (see [`crate::core::planner`]).
pub fn resolve(config_path: &Path, cli: &CliOverrides) -> anyhow::Result<Settings> {
    let mut merged = DEFAULT_SETTINGS.clone();

    if let Ok(contents) = fs::read_to_string(config_path) {
        if let Ok(overlay @ Value::Object(_)) = serde_json::from_str::<Value>(&contents) {
            deep_merge(&mut merged, overlay);
        }
    }

    strip_cli_only_keys(&mut merged);

    let mut settings: Settings = match serde_json::from_value(merged) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!(
                "{} {}: {e}",
                "ignoring unusable settings override".yellow(),
                config_path.display()
            );
            serde_json::from_value(DEFAULT_SETTINGS.clone())?
        }
    };

    match cli.submit {
        Some(true) => settings.auto_submit = true,
        Some(false) => settings.submit.request = false,
        None => {}
    }
    settings.silent = cli.silent;

    Ok(settings)
}

/// Deep-merges `overlay` into `base`: object values merge recursively,
/// everything else (scalars and arrays alike) replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Removes the keys that must never be read from persisted file content.
fn strip_cli_only_keys(merged: &mut Value) {
    if let Value::Object(map) = merged {
        map.remove("silent");
        map.remove("auto-submit");
        if let Some(Value::Object(submit)) = map.get_mut("submit") {
            submit.remove("auto-submit");
        }
    }
}
