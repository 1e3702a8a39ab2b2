//! Layer that injects text when the prompt matches a pattern

use regex::RegexBuilder;
use serde::Deserialize;

use super::{Layer, LayerError, LayerInvocation};

#[derive(Debug, Deserialize)]
struct KeywordRule {
    pattern: String,
    text: String,
}

/// Contributes the `text` of every rule in `settings.rules` whose regex
/// `pattern` matches the prompt, in rule order, one per line.
///
/// Matching is case-insensitive unless `settings.case_sensitive = true`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordLayer;

impl Layer for KeywordLayer {
    fn execute(&self, invocation: &mut LayerInvocation<'_>) -> Result<String, LayerError> {
        let raw_rules = invocation
            .settings
            .get("rules")
            .cloned()
            .ok_or_else(|| LayerError::MissingSetting {
                key: "rules".to_string(),
            })?;
        let rules: Vec<KeywordRule> =
            serde_json::from_value(raw_rules).map_err(|e| LayerError::invalid("rules", e))?;
        let case_sensitive = invocation.setting_bool("case_sensitive")?.unwrap_or(false);

        let mut matched = Vec::new();
        for rule in &rules {
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| {
                    LayerError::invalid("rules", format!("pattern '{}': {e}", rule.pattern))
                })?;
            if regex.is_match(invocation.prompt) {
                matched.push(rule.text.trim());
            }
        }

        Ok(matched.join("\n"))
    }
}
