//! # Init Command Module
//!
//! Creates a starter `testmin.config.json`, either from a fixed template
//! or through a small interactive wizard.

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use crate::core::config::GLOBAL_CONFIG_FILE;

const STARTER_CONFIG: &str = r#"{
  "timeout": 30,
  "submit": {
    "request": false
  }
}
"#;

/// Executes the init command.
pub fn execute(force: bool, non_interactive: bool) -> Result<()> {
    let path = PathBuf::from(GLOBAL_CONFIG_FILE);

    if path.exists() && !force {
        println!(
            "{} {}",
            path.display().to_string().yellow(),
            "already exists; pass --force to overwrite".yellow()
        );
        return Ok(());
    }

    let contents = if non_interactive {
        STARTER_CONFIG.to_string()
    } else {
        wizard()?
    };

    fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("{} {}", "created".green(), path.display());

    Ok(())
}

fn wizard() -> Result<String> {
    let timeout: u64 = Input::new()
        .with_prompt("Default per-file timeout in seconds (0 for no timeout)")
        .default(30)
        .interact_text()?;

    let request = Confirm::new()
        .with_prompt("Offer to submit results after each run?")
        .default(false)
        .interact()?;

    let project: String = Input::new()
        .with_prompt("Project identifier (leave empty for none)")
        .allow_empty(true)
        .interact_text()?;

    let mut settings = json!({
        "timeout": timeout,
        "submit": {
            "request": request,
        },
    });
    if !project.is_empty() {
        settings["project-id"] = json!(project);
    }

    let mut contents = serde_json::to_string_pretty(&settings)?;
    contents.push('\n');
    Ok(contents)
}
