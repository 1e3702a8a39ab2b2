//! Context layers and the registry that resolves them
//!
//! A [`Layer`] reads the accumulated context and returns a text fragment.
//! It may only mutate its own session-state slot, handed to it through
//! [`LayerInvocation::state`]; earlier fragments are visible read-only.

mod file;
mod history;
mod keyword;

pub use file::FileLayer;
pub use history::HistoryLayer;
pub use keyword::KeywordLayer;

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::context::{ContextConfig, LayerOutput};

/// Errors a layer can report. These never abort a run on their own.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("missing setting '{key}'")]
    MissingSetting { key: String },

    #[error("invalid setting '{key}': {message}")]
    InvalidSetting { key: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no layer registered for kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("layer panicked: {message}")]
    Panicked { message: String },

    #[error("{0}")]
    Other(String),
}

impl LayerError {
    pub fn invalid(key: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// Everything a layer may see, plus its own mutable state slot
pub struct LayerInvocation<'a> {
    /// Name of the manifest entry being executed
    pub name: &'a str,
    pub prompt: &'a str,
    /// Prompt count before this run
    pub prompt_count: u64,
    pub config: &'a ContextConfig,
    /// The entry's `settings` table
    pub settings: &'a Map<String, Value>,
    /// Fragments of the layers that already ran, in order
    pub previous_layers: &'a [LayerOutput],
    /// This layer's session-state slot; `Null` when empty
    pub state: &'a mut Value,
}

impl LayerInvocation<'_> {
    /// Required string setting.
    pub fn setting_str(&self, key: &str) -> Result<&str, LayerError> {
        match self.settings.get(key) {
            Some(Value::String(value)) => Ok(value),
            Some(other) => Err(LayerError::invalid(key, format!("expected a string, got {other}"))),
            None => Err(LayerError::MissingSetting {
                key: key.to_string(),
            }),
        }
    }

    /// Optional unsigned integer setting.
    pub fn setting_u64(&self, key: &str) -> Result<Option<u64>, LayerError> {
        match self.settings.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| {
                    LayerError::invalid(key, format!("expected an unsigned integer, got {value}"))
                }),
        }
    }

    /// Optional boolean setting.
    pub fn setting_bool(&self, key: &str) -> Result<Option<bool>, LayerError> {
        match self.settings.get(key) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(other) => {
                Err(LayerError::invalid(key, format!("expected a boolean, got {other}")))
            }
        }
    }

    /// Fragment produced by an earlier layer, if it ran.
    pub fn previous(&self, layer: &str) -> Option<&str> {
        self.previous_layers
            .iter()
            .find(|output| output.layer == layer)
            .map(|output| output.output.as_str())
    }
}

/// One unit of context enrichment.
pub trait Layer: Send + Sync {
    /// Produce this layer's fragment for the current turn.
    ///
    /// An empty string contributes nothing to the composed text.
    fn execute(&self, invocation: &mut LayerInvocation<'_>) -> Result<String, LayerError>;
}

/// Maps manifest `kind` keys to layer implementations
pub struct LayerRegistry {
    layers: HashMap<String, Box<dyn Layer>>,
}

impl LayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }

    /// Create a registry with the built-in layers registered.
    ///
    /// - `file` -> [`FileLayer`]
    /// - `keyword` -> [`KeywordLayer`]
    /// - `history` -> [`HistoryLayer`]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("file", FileLayer);
        registry.register("keyword", KeywordLayer);
        registry.register("history", HistoryLayer);
        registry
    }

    /// Register `layer` under `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: impl Into<String>, layer: impl Layer + 'static) {
        self.layers.insert(kind.into(), Box::new(layer));
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Layer> {
        self.layers.get(kind).map(|layer| layer.as_ref())
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.layers.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.layers.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(&'static str);

    impl Layer for Constant {
        fn execute(&self, _: &mut LayerInvocation<'_>) -> Result<String, LayerError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = LayerRegistry::with_builtins();
        assert_eq!(registry.kinds(), vec!["file", "history", "keyword"]);
        assert!(registry.has_kind("file"));
        assert!(!registry.has_kind("unknown"));
    }

    #[test]
    fn register_replaces_existing_kind() {
        let mut registry = LayerRegistry::new();
        assert!(registry.is_empty());
        registry.register("x", Constant("one"));
        registry.register("x", Constant("two"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invocation_settings_are_typed() {
        let config = ContextConfig {
            synapse_path: PathBuf::from("/tmp/.synapse"),
            manifest: Map::new(),
            devmode: false,
            extra: Map::new(),
        };
        let mut settings = Map::new();
        settings.insert("path".into(), Value::from("a.md"));
        settings.insert("limit".into(), Value::from(3));
        settings.insert("flag".into(), Value::from("nope"));
        let previous = vec![LayerOutput::new("global", "g")];
        let mut state = Value::Null;

        let invocation = LayerInvocation {
            name: "t",
            prompt: "",
            prompt_count: 0,
            config: &config,
            settings: &settings,
            previous_layers: &previous,
            state: &mut state,
        };

        assert_eq!(invocation.setting_str("path").unwrap(), "a.md");
        assert_eq!(invocation.setting_u64("limit").unwrap(), Some(3));
        assert!(matches!(
            invocation.setting_str("missing"),
            Err(LayerError::MissingSetting { .. })
        ));
        assert!(invocation.setting_bool("flag").is_err());
        assert_eq!(invocation.previous("global"), Some("g"));
        assert_eq!(invocation.previous("local"), None);
    }
}
