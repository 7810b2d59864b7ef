//! # Directory Scanner Module
//!
//! This module turns a root directory into an ordered list of
//! [`DirDescriptor`]s ready to run: the root itself plus its immediate
//! child directories (discovery never descends further), each with its
//! per-directory settings loaded and its file set resolved.
//!
//! The file set starts from the `files` mapping declared in the
//! directory's `testmin.dir.json` (in declaration order) and is reconciled
//! against the filesystem: declared entries whose file no longer exists
//! are silently dropped, and every executable regular file not already
//! listed is appended in enumeration order. Descriptors are then
//! stable-sorted on their `dir-order` key; ties keep discovery order,
//! which matters because directory run order is part of the observable
//! log.

use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::Settings;
use crate::core::models::FileConfig;

/// Per-directory settings file name.
pub const DIR_SETTINGS_FILE: &str = "testmin.dir.json";

/// Order assigned to directories without an explicit `dir-order`:
/// effectively "last unless specified".
pub const DEFAULT_DIR_ORDER: i64 = 1_000_000;

/// Default order of the root directory, placing it before all
/// subdirectories.
pub const ROOT_DIR_ORDER: i64 = -1;

/// Files matching this prefix are development scratch files and are
/// excluded from discovery entirely.
const DEV_PREFIX: &str = "dev.";

/// The scanner's resolved view of one test directory.
#[derive(Debug)]
pub struct DirDescriptor {
    pub path: PathBuf,
    /// Name under which this directory appears in the run log: `.` for
    /// the root, the directory name for children.
    pub display_name: String,
    pub order: i64,
    pub title: Option<String>,
    pub skip: bool,
    /// Resolved file set: declared entries first, in declaration order,
    /// then auto-discovered entries in enumeration order.
    pub files: Vec<(String, FileConfig)>,
}

impl DirDescriptor {
    /// The heading shown above this directory's run output.
    pub fn heading(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.display_name)
    }
}

/// A configuration-level fault that aborts the whole scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// The per-directory settings file was unreadable or not a JSON
    /// object.
    DirSettingsParse,
    /// The declared `files` value is present but not a mapping.
    BadFilesDeclaration,
    /// A candidate directory could not be enumerated.
    DirUnreadable,
}

impl ScanErrorKind {
    /// Stable identifier recorded in the run log.
    pub fn id(&self) -> &'static str {
        match self {
            ScanErrorKind::DirSettingsParse => "testmin.dir.json-parse-error",
            ScanErrorKind::BadFilesDeclaration => "files-not-a-mapping",
            ScanErrorKind::DirUnreadable => "dir-unreadable",
        }
    }
}

#[derive(Debug)]
pub struct ScanError {
    pub dir: String,
    pub kind: ScanErrorKind,
    pub message: String,
}

impl ScanError {
    fn new(dir: &Path, kind: ScanErrorKind, message: impl Into<String>) -> Self {
        ScanError {
            dir: dir.display().to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.kind.id(), self.dir, self.message)
    }
}

impl std::error::Error for ScanError {}

/// Scans `root` and returns the ordered list of directories to run.
///
/// Any error here is a hard stop for the whole run, not a per-directory
/// skip; the aggregator records it and reports overall failure.
pub fn scan(root: &Path, settings: &Settings) -> Result<Vec<DirDescriptor>, ScanError> {
    let root = normalize(root);
    let own_exe = std::env::current_exe()
        .ok()
        .and_then(|path| fs::canonicalize(path).ok());

    let mut dirs = vec![dir_settings(&root, ".", true, settings)?];

    let entries = fs::read_dir(&root)
        .map_err(|e| ScanError::new(&root, ScanErrorKind::DirUnreadable, e.to_string()))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| ScanError::new(&root, ScanErrorKind::DirUnreadable, e.to_string()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        dirs.push(dir_settings(&entry.path(), &name, false, settings)?);
    }

    for dir in &mut dirs {
        dir_check(dir, settings, own_exe.as_deref())?;
    }

    // Stable sort: ties keep discovery order.
    dirs.sort_by_key(|dir| dir.order);

    Ok(dirs)
}

/// Strips trailing path separators.
fn normalize(path: &Path) -> PathBuf {
    let mut text = path.to_string_lossy().into_owned();
    while text.len() > 1 && text.ends_with(std::path::MAIN_SEPARATOR) {
        text.pop();
    }
    PathBuf::from(text)
}

/// Loads a directory's settings file and builds its descriptor with the
/// declared part of the file set.
fn dir_settings(
    path: &Path,
    display_name: &str,
    is_root: bool,
    settings: &Settings,
) -> Result<DirDescriptor, ScanError> {
    let default_order = if is_root {
        ROOT_DIR_ORDER
    } else {
        DEFAULT_DIR_ORDER
    };

    let mut dir = DirDescriptor {
        path: path.to_path_buf(),
        display_name: display_name.to_string(),
        order: default_order,
        title: None,
        skip: false,
        files: Vec::new(),
    };

    let settings_path = path.join(DIR_SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(dir);
    }

    let contents = fs::read_to_string(&settings_path)
        .map_err(|e| ScanError::new(path, ScanErrorKind::DirSettingsParse, e.to_string()))?;
    let parsed: Value = serde_json::from_str(&contents)
        .map_err(|e| ScanError::new(path, ScanErrorKind::DirSettingsParse, e.to_string()))?;
    let Value::Object(dir_config) = parsed else {
        return Err(ScanError::new(
            path,
            ScanErrorKind::DirSettingsParse,
            "expected a JSON object",
        ));
    };

    if let Some(order) = dir_config.get("dir-order").and_then(Value::as_i64) {
        dir.order = order;
    }
    dir.title = dir_config
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);
    dir.skip = dir_config
        .get("skip")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    match dir_config.get("files") {
        None => {}
        Some(Value::Object(declared)) => {
            for (name, value) in declared {
                // A declared file that no longer exists on disk is
                // silently dropped.
                if !path.join(name).is_file() {
                    continue;
                }
                dir.files
                    .push((name.clone(), FileConfig::decode(value, settings.timeout)));
            }
        }
        Some(other) => {
            return Err(ScanError::new(
                path,
                ScanErrorKind::BadFilesDeclaration,
                format!("files setting is not a mapping (got {})", type_name(other)),
            ));
        }
    }

    Ok(dir)
}

/// Reconciles a descriptor's file set against the filesystem, appending
/// every runnable file not already declared.
fn dir_check(
    dir: &mut DirDescriptor,
    settings: &Settings,
    own_exe: Option<&Path>,
) -> Result<(), ScanError> {
    let entries = fs::read_dir(&dir.path)
        .map_err(|e| ScanError::new(&dir.path, ScanErrorKind::DirUnreadable, e.to_string()))?;

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy().into_owned();

        if name.starts_with(DEV_PREFIX) {
            continue;
        }
        if dir.files.iter().any(|(declared, _)| declared == &name) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() || !is_executable(&metadata) {
            continue;
        }
        // Never run the orchestrator itself.
        if let Some(own) = own_exe {
            if fs::canonicalize(entry.path()).ok().as_deref() == Some(own) {
                continue;
            }
        }

        dir.files.push((
            name,
            FileConfig::Enabled {
                timeout: settings.timeout,
            },
        ));
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
