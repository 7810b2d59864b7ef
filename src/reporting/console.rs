//! # Console Output Module
//!
//! All console output from the core flows through [`Console`], which is
//! the verbosity gate: in silent mode nothing is printed. The core never
//! decides that policy itself, it only calls through here.

use colored::*;

use crate::infra::messages::Messages;

/// Length of horizontal rules.
pub const HR_LENGTH: usize = 100;

/// Verbosity-gated print sink.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    silent: bool,
}

impl Console {
    pub fn new(silent: bool) -> Self {
        Console { silent }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn say(&self, text: &str) {
        if !self.silent {
            println!("{text}");
        }
    }

    pub fn blank(&self) {
        if !self.silent {
            println!();
        }
    }

    /// Prints a full-width horizontal rule.
    pub fn hr(&self, dash: char) {
        self.say(&dash.to_string().repeat(HR_LENGTH));
    }

    /// Prints a titled horizontal rule, e.g. `=== title ====...`.
    pub fn hr_titled(&self, dash: char, title: &str) {
        if title.is_empty() {
            self.hr(dash);
            return;
        }
        let dash = dash.to_string();
        let tail = HR_LENGTH.saturating_sub(5 + title.chars().count());
        self.say(&format!("{} {} {}", dash.repeat(3), title, dash.repeat(tail)));
    }
}

/// Prints the end-of-run banner with the overall verdict.
pub fn print_run_summary(console: &Console, success: bool, messages: &Messages) {
    console.blank();
    console.hr_titled('=', &messages.get("finished-testing"));
    let verdict = if success {
        messages.get("test-success").green()
    } else {
        messages.get("test-failure").red()
    };
    console.say(&verdict.to_string());
    console.hr('=');
    console.blank();
}
