//! Host-facing hook payload
//!
//! The payload shape is a compatibility contract with the assistant host:
//! `{"hookSpecificOutput":{"additionalContext":"..."}}`. The field is always
//! present, and the text is passed through verbatim.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub additional_context: String,
}

/// Envelope handed to the host at the end of a turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookPayload {
    pub hook_specific_output: HookSpecificOutput,
}

impl HookPayload {
    /// Wrap composed text without altering it.
    pub fn wrap(text: impl Into<String>) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                additional_context: text.into(),
            },
        }
    }

    pub fn additional_context(&self) -> &str {
        &self.hook_specific_output.additional_context
    }

    /// Serialize to a single JSON line.
    ///
    /// No control character (C0, DEL, C1) or line/paragraph separator is
    /// left raw; serde_json only escapes the C0 range itself.
    pub fn to_json(&self) -> Result<String> {
        Ok(escape_raw_controls(&serde_json::to_string(self)?))
    }
}

/// Rewrite characters serde_json leaves raw as `\uXXXX` escapes.
///
/// Only applied to serialized JSON, where such characters can appear solely
/// inside string literals, so the escape is always valid.
fn escape_raw_controls(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_control() || c == '\u{2028}' || c == '\u{2029}' {
            escaped.push_str(&format!("\\u{:04x}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

impl From<Option<String>> for HookPayload {
    fn from(text: Option<String>) -> Self {
        Self::wrap(text.unwrap_or_default())
    }
}

/// Input the host sends to the hook entry point
///
/// Unknown fields are ignored so host-side additions never break parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl HookInput {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
