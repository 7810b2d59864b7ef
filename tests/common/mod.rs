// Shared helpers for building executable test-file fixtures.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

use testmin::core::config::{self, CliOverrides, Settings};

/// A test file that reports success.
pub const PASS_SCRIPT: &str = "#!/bin/sh\necho running\necho '{\"testmin-success\": true}'\n";

/// A test file that reports failure.
pub const FAIL_SCRIPT: &str = "#!/bin/sh\necho oh no >&2\necho '{\"testmin-success\": false}'\n";

/// A test file that reports success with extra detail fields.
pub const DETAILS_SCRIPT: &str =
    "#!/bin/sh\necho '{\"testmin-success\": true, \"x\": 1}'\n";

/// A test file that violates the protocol: exits cleanly, no status line.
pub const NO_STATUS_SCRIPT: &str = "#!/bin/sh\necho just noise\n";

/// A test file that outlives any short timeout.
pub const SLEEP_SCRIPT: &str = "#!/bin/sh\nsleep 5\necho '{\"testmin-success\": true}'\n";

pub fn setup_tree() -> TempDir {
    tempdir().expect("failed to create temporary directory")
}

pub fn make_subdir(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    fs::create_dir(&path).expect("failed to create subdirectory");
    path
}

/// Writes an executable script into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("failed to write script");
    make_executable(&path);
    path
}

/// Writes a plain, non-executable file into `dir`.
pub fn write_plain_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("failed to write file");
    path
}

pub fn write_dir_settings(dir: &Path, json: &str) {
    fs::write(dir.join("testmin.dir.json"), json).expect("failed to write dir settings");
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .expect("failed to stat script")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("failed to set permissions");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// Default settings, resolved without any on-disk override.
pub fn test_settings() -> Settings {
    config::resolve(
        Path::new("testmin-no-such-config.json"),
        &CliOverrides::default(),
    )
    .expect("failed to resolve default settings")
}
