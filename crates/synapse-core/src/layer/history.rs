//! Layer that remembers recent prompts across turns

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Layer, LayerError, LayerInvocation};

const DEFAULT_LIMIT: u64 = 5;

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryState {
    #[serde(default)]
    recent: Vec<String>,
}

/// Recaps the prompts of earlier turns and records the current one.
///
/// State lives in the layer's own session slot as `{ "recent": [...] }`,
/// capped at `settings.limit` entries (default 5).
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryLayer;

impl Layer for HistoryLayer {
    fn execute(&self, invocation: &mut LayerInvocation<'_>) -> Result<String, LayerError> {
        let limit = invocation.setting_u64("limit")?.unwrap_or(DEFAULT_LIMIT) as usize;

        // Unreadable slots reset to an empty history.
        let mut history: HistoryState = match invocation.state.take() {
            Value::Null => HistoryState::default(),
            value => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(
                    layer = invocation.name,
                    error = %e,
                    "Discarding unreadable history state"
                );
                HistoryState::default()
            }),
        };

        let output = if history.recent.is_empty() {
            String::new()
        } else {
            let mut recap = String::from("Recent prompts:");
            for prompt in &history.recent {
                recap.push_str("\n- ");
                recap.push_str(prompt);
            }
            recap
        };

        let prompt = invocation.prompt.trim();
        if !prompt.is_empty() {
            history.recent.push(prompt.to_string());
        }
        if history.recent.len() > limit {
            let excess = history.recent.len() - limit;
            history.recent.drain(..excess);
        }

        *invocation.state = serde_json::to_value(&history)
            .map_err(|e| LayerError::Other(format!("cannot encode history state: {e}")))?;

        Ok(output)
    }
}
