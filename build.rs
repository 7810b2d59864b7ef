//! Embeds the version of the toolchain that built the binary, recorded in
//! the run log's version block alongside the testmin and OS versions.

use std::process::Command;

fn main() {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    let version = Command::new(&rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=TESTMIN_RUSTC_VERSION={version}");
    println!("cargo:rerun-if-changed=build.rs");
}
