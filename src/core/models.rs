//! # Data Models Module
//!
//! This module defines the structures that make up a run log, the resolved
//! per-file configuration and the outcome of a single subprocess run. The
//! serialized log is part of the external interface (it is what gets
//! submitted to a collector), so field names here follow the established
//! log format (`run-time`, `timed-out`, `exception-message`, ...).

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::core::config::Settings;
use crate::core::planner::ScanError;

/// Testmin version, stamped into the log and exported to child processes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolved configuration for one test file, decoded once at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileConfig {
    /// Run the file with this timeout (seconds, 0 = unbounded).
    Enabled { timeout: u64 },
    /// Listed in the directory settings but explicitly not run.
    Disabled,
}

impl FileConfig {
    /// Decodes a raw configuration value from a directory settings file.
    ///
    /// `false` disables the file; an object may carry a per-file `timeout`;
    /// anything else (including `true`) enables the file with the global
    /// default timeout.
    pub fn decode(value: &Value, default_timeout: u64) -> Self {
        match value {
            Value::Bool(false) => FileConfig::Disabled,
            Value::Object(settings) => FileConfig::Enabled {
                timeout: settings
                    .get("timeout")
                    .and_then(Value::as_u64)
                    .unwrap_or(default_timeout),
            },
            _ => FileConfig::Enabled {
                timeout: default_timeout,
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, FileConfig::Enabled { .. })
    }
}

/// Raw outcome of running one test file as a subprocess.
#[derive(Debug)]
pub struct FileOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    /// The exceeded timeout value, when the process was killed.
    pub timed_out: Option<u64>,
    /// Auxiliary fields from the status line, minus the success indicator.
    pub details: Option<Map<String, Value>>,
}

/// A string-keyed map that serializes as a JSON object in insertion order.
///
/// Run order is part of the observable log, so directory and file entries
/// must not be re-sorted by key on serialization.
#[derive(Debug, Default)]
pub struct OrderedMap<T>(Vec<(String, T)>);

impl<T> OrderedMap<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.0.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Serialize> Serialize for OrderedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A configuration-level fault recorded against the whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunError {
    pub id: String,
    #[serde(rename = "exception-message")]
    pub message: String,
}

impl From<&ScanError> for RunError {
    fn from(error: &ScanError) -> Self {
        RunError {
            id: error.kind.id().to_string(),
            message: error.message.clone(),
        }
    }
}

/// Version and environment metadata captured at log creation.
#[derive(Debug, Clone, Serialize)]
pub struct Versions {
    pub testmin: String,
    pub os: OsVersions,
    pub rust: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OsVersions {
    pub version: String,
    pub release: String,
}

impl Versions {
    pub fn collect() -> Self {
        Versions {
            testmin: VERSION.to_string(),
            os: OsVersions {
                version: uname("-v"),
                release: uname("-r"),
            },
            rust: env!("TESTMIN_RUSTC_VERSION").to_string(),
        }
    }
}

fn uname(flag: &str) -> String {
    std::process::Command::new("uname")
        .arg(flag)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Log entry for one executed test file.
#[derive(Debug, Serialize)]
pub struct FileLog {
    pub file_order: u64,
    pub success: bool,
    #[serde(rename = "run-time")]
    pub run_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    #[serde(rename = "timed-out", skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl FileLog {
    /// Builds the log entry for an outcome. Captured output is attached
    /// only on failure to keep the log compact.
    pub fn from_outcome(file_order: u64, outcome: FileOutcome) -> Self {
        let (stdout, stderr) = if outcome.success {
            (None, None)
        } else {
            (Some(outcome.stdout), Some(outcome.stderr))
        };
        FileLog {
            file_order,
            success: outcome.success,
            run_time: outcome.elapsed.as_secs_f64(),
            details: outcome.details,
            timed_out: outcome.timed_out,
            stdout,
            stderr,
        }
    }
}

/// Log entry for one scanned directory.
#[derive(Debug, Serialize)]
pub struct DirLog {
    pub dir_order: u64,
    #[serde(rename = "run-time")]
    pub run_time: f64,
    #[serde(rename = "files-run")]
    pub files_run: u64,
    #[serde(skip_serializing_if = "is_false")]
    pub skipped: bool,
    pub files: OrderedMap<FileLog>,
}

impl DirLog {
    pub fn new(dir_order: u64) -> Self {
        DirLog {
            dir_order,
            run_time: 0.0,
            files_run: 0,
            skipped: false,
            files: OrderedMap::new(),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The aggregate output of one full invocation. Written only by the run
/// aggregator; every other component just reads it.
#[derive(Debug, Serialize)]
pub struct RunLog {
    pub id: String,
    pub success: bool,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RunError>,
    #[serde(rename = "project-id", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "client-id", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub versions: Versions,
    pub dirs: OrderedMap<DirLog>,
    /// Submission-only data (email, comments); never printed.
    pub private: Map<String, Value>,
    #[serde(rename = "run-time")]
    pub run_time: f64,
}

impl RunLog {
    pub fn new(settings: &Settings) -> Self {
        RunLog {
            id: random_id(20),
            success: true,
            created: Utc::now(),
            errors: Vec::new(),
            project_id: settings.project_id.clone(),
            client_id: settings.client_id.clone(),
            versions: Versions::collect(),
            dirs: OrderedMap::new(),
            private: Map::new(),
            run_time: 0.0,
        }
    }
}

/// Generates a random identifier of lowercase letters.
pub fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}
