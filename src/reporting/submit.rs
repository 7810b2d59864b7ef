//! # Result Submission Module
//!
//! Optional submission of the run log to a remote collector. The whole
//! flow sits outside the orchestration core: by the time it runs the log
//! is complete, and nothing here may alter it beyond adding the private
//! email/comments fields the user explicitly volunteers.

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Input};
use serde_json::Value;
use std::io::Write;

use crate::core::config::Settings;
use crate::core::models::RunLog;
use crate::infra::messages::{Messages, collapse};
use crate::reporting::console::Console;

/// Submits the run log to the configured collector, if requested.
///
/// Returns `Ok(())` when submission is disabled or declined. Errors are
/// reported to the caller for display only; they never affect the run's
/// outcome.
pub async fn submit_results(
    log: &mut RunLog,
    settings: &Settings,
    messages: &Messages,
    console: &Console,
) -> Result<()> {
    if !settings.submit.request {
        return Ok(());
    }
    if !submit_ask(settings, messages)? {
        return Ok(());
    }

    email_ask(log, settings, messages)?;
    comments_ask(log, settings, messages)?;

    console.say(&messages.get("submit-hold"));

    let site = &settings.submit.site;
    let url = format!("{}{}", site.root, site.submit);
    let payload = serde_json::to_string(log).context("failed to serialize run log")?;

    let response = reqwest::Client::new()
        .post(&url)
        .form(&[("test-results", payload)])
        .send()
        .await
        .with_context(|| format!("failed to reach {url}"))?;

    if !response.status().is_success() {
        bail!("submission endpoint returned {}", response.status());
    }

    let body: Value = response
        .json()
        .await
        .context("submission response was not JSON")?;

    if body.get("success").and_then(Value::as_bool).unwrap_or(false) {
        console.say(&messages.get("submit-success"));
    } else {
        let errors = body
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("id").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        console.say(&messages.format("submit-failure", &[("errors", &errors)]));
    }

    Ok(())
}

/// Whether the results should actually be sent: either auto-submit was
/// set on the command line, or the user agrees at the prompt.
fn submit_ask(settings: &Settings, messages: &Messages) -> Result<bool> {
    if settings.auto_submit {
        return Ok(true);
    }
    let prompt = collapse(&messages.format(
        "submit-request",
        &[("title", settings.submit.site.title.as_str())],
    ));
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn email_ask(log: &mut RunLog, settings: &Settings, messages: &Messages) -> Result<()> {
    if !settings.submit.email {
        return Ok(());
    }
    let prompt = collapse(&messages.get("email-request"));
    if !Confirm::new().with_prompt(prompt).default(false).interact()? {
        return Ok(());
    }

    let email: String = Input::new()
        .with_prompt(messages.get("email-prompt"))
        .interact_text()?;
    log.private
        .insert("email".to_string(), Value::String(collapse(&email)));
    Ok(())
}

/// Collects free-form comments through `$EDITOR`, when one is set.
fn comments_ask(log: &mut RunLog, settings: &Settings, messages: &Messages) -> Result<()> {
    if !settings.submit.comments {
        return Ok(());
    }
    let Ok(editor) = std::env::var("EDITOR") else {
        return Ok(());
    };
    if editor.is_empty() {
        return Ok(());
    }

    let prompt = collapse(&messages.get("comments-request"));
    if !Confirm::new().with_prompt(prompt).default(false).interact()? {
        return Ok(());
    }

    let mut file = tempfile::Builder::new()
        .prefix("testmin-comments-")
        .suffix(".txt")
        .tempfile()
        .context("failed to create comments file")?;
    writeln!(file, "{}", messages.get("add-comments"))?;

    let status = std::process::Command::new(&editor)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor {editor}"))?;
    if !status.success() {
        bail!("editor exited with {status}");
    }

    let comments = std::fs::read_to_string(file.path())?;
    log.private
        .insert("comments".to_string(), Value::String(comments));
    Ok(())
}
