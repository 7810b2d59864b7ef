//! # Message Templating Module
//!
//! All user-facing text comes from the `messages` mapping inside the
//! resolved settings, keyed by language code then message id, so that
//! deployments can override or translate any of it through the same
//! deep-merged configuration as everything else.
//!
//! Lookup walks a language chain built from the system locale with `en`
//! as the final fallback. Templates may carry `[[field]]` markers which
//! are substituted case-insensitively.

use serde_json::{Map, Value};

use crate::core::config::Settings;

/// Message lookup over the settings' template mapping.
#[derive(Debug, Clone)]
pub struct Messages {
    languages: Vec<String>,
    root: Map<String, Value>,
}

impl Messages {
    pub fn new(settings: &Settings) -> Self {
        let mut languages = Vec::new();

        // Try the language part of the system locale first (e.g. "en"
        // from "en-US"), then fall back to "en".
        if let Some(locale) = sys_locale::get_locale() {
            if let Some(lang) = locale.split('-').next() {
                if !lang.is_empty() {
                    languages.push(lang.to_string());
                }
            }
        }
        if !languages.iter().any(|l| l == "en") {
            languages.push("en".to_string());
        }

        Messages {
            languages,
            root: settings.messages.clone(),
        }
    }

    /// Looks up a message template with no substitutions.
    pub fn get(&self, id: &str) -> String {
        self.format(id, &[])
    }

    /// Looks up a message template and substitutes its `[[field]]`
    /// markers. A message id with no template in any language degrades to
    /// the id itself rather than failing the run.
    pub fn format(&self, id: &str, fields: &[(&str, &str)]) -> String {
        for language in &self.languages {
            if let Some(Value::Object(table)) = self.root.get(language) {
                if let Some(Value::String(template)) = table.get(id) {
                    return substitute(template, fields);
                }
            }
        }
        id.to_string()
    }
}

/// Replaces `[[field]]` markers. Marker names are matched
/// case-insensitively and tolerate inner padding; unknown markers are
/// left in place.
fn substitute(template: &str, fields: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("[[") {
        let Some(end) = rest[start + 2..].find("]]") else {
            break;
        };
        let marker_end = start + 2 + end + 2;
        let key = rest[start + 2..start + 2 + end].trim();

        out.push_str(&rest[..start]);
        match fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
        {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..marker_end]),
        }
        rest = &rest[marker_end..];
    }

    out.push_str(rest);
    out
}

/// Trims a string and collapses internal whitespace runs to single
/// spaces. Used for prompts and single-line user input.
pub fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
