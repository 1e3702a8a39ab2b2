//! Configuration resolution with hierarchical merge

use std::path::PathBuf;

use serde_json::{Map, Value};
use synapse_fs::{NormalizedPath, SynapsePath, io};

use crate::{Error, Result};

/// Resolves engine configuration by merging the config files in order
pub struct ConfigResolver {
    /// The `.synapse` directory
    synapse_path: NormalizedPath,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()/synapse` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(synapse_path: impl Into<NormalizedPath>) -> Self {
        Self {
            synapse_path: synapse_path.into(),
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    pub fn with_global_config_dir(
        synapse_path: impl Into<NormalizedPath>,
        global_config_dir: PathBuf,
    ) -> Self {
        Self {
            synapse_path: synapse_path.into(),
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("synapse"))
    }

    /// Files consulted by [`resolve`](Self::resolve), in merge order.
    pub fn sources(&self) -> Vec<NormalizedPath> {
        let mut sources = Vec::with_capacity(3);
        if let Some(global_dir) = self.global_config_dir() {
            sources.push(NormalizedPath::new(global_dir.join(SynapsePath::Config.as_str())));
        }
        sources.push(self.synapse_path.join(SynapsePath::Config.as_str()));
        sources.push(self.synapse_path.join(SynapsePath::LocalConfig.as_str()));
        sources
    }

    /// Merge all config sources into one table.
    ///
    /// Missing files are skipped. Invalid TOML in any source is a
    /// configuration error.
    pub fn resolve(&self) -> Result<Map<String, Value>> {
        let mut merged = Value::Object(Map::new());

        for (layer, path) in self.sources().into_iter().enumerate() {
            let Some(content) = io::read_text_if_exists(&path)? else {
                tracing::debug!(%path, layer = layer + 1, "No config found - skipping");
                continue;
            };
            tracing::debug!(%path, layer = layer + 1, "Loading config");
            let table: Value = toml::from_str(&content)
                .map_err(|e| Error::config(format!("invalid config at {path}: {e}")))?;
            deep_merge_value(&mut merged, &table);
        }

        match merged {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Deep merge two JSON values
///
/// If both values are objects, merge them recursively with `other` taking
/// precedence. Otherwise, `other` replaces `base`.
pub fn deep_merge_value(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge_value(base_val, other_val);
                } else {
                    base_map.insert(key.clone(), other_val.clone());
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}
