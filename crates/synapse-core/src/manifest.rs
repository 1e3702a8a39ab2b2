//! Layer manifest parsing and validation
//!
//! The manifest (`<synapse_path>/manifest.toml`) declares which layers run,
//! in what order, and with which settings. It is re-read on every run so
//! edits take effect on the next turn.
//!
//! ```toml
//! version = "2.0"
//!
//! [[layers]]
//! name = "global"
//! kind = "file"
//! settings = { path = "global.md" }
//!
//! [[layers]]
//! name = "history"
//! budget_ms = 50
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use synapse_fs::{NormalizedPath, SynapsePath, io};

use crate::{Error, Result};

/// Highest manifest major version this engine understands
pub const SUPPORTED_MAJOR: u64 = 2;

/// Separator placed between two non-empty fragments unless a layer overrides it
pub const DEFAULT_SEPARATOR: &str = "\n\n";

fn default_version() -> String {
    "2.0".to_string()
}

fn default_enabled() -> bool {
    true
}

/// One declared layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    /// Unique layer name; also the key of the layer's session-state slot
    pub name: String,

    /// Registry key of the implementation; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Explicit execution position; defaults to the list index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Text placed before this layer's fragment when something precedes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    /// Soft execution budget; overruns are reported, never preempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_ms: Option<u64>,

    /// Layer-specific settings
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl LayerEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            order: None,
            enabled: true,
            separator: None,
            budget_ms: None,
            settings: Map::new(),
        }
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.name)
    }

    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR)
    }
}

/// Parsed layer manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version tag
    #[serde(default = "default_version")]
    pub version: String,

    /// Treat the first layer failure as fatal for the run
    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub layers: Vec<LayerEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::empty()
    }
}

impl Manifest {
    /// A manifest with no layers; running it produces empty output.
    pub fn empty() -> Self {
        Self {
            version: default_version(),
            strict: false,
            layers: Vec::new(),
        }
    }

    /// Path of the manifest file under `synapse_path`.
    pub fn path_in(synapse_path: &Path) -> NormalizedPath {
        NormalizedPath::new(synapse_path).join(SynapsePath::Manifest.as_str())
    }

    /// Load and validate the manifest under `synapse_path`.
    ///
    /// A missing file yields [`Manifest::empty`]; unreadable or malformed
    /// content is an [`Error::Manifest`].
    pub fn load(synapse_path: &Path) -> Result<Self> {
        let path = Self::path_in(synapse_path);
        let content = io::read_text_if_exists(&path).map_err(|e| Error::Manifest {
            path: path.to_native(),
            message: e.to_string(),
        })?;

        match content {
            Some(content) => {
                tracing::debug!(%path, "Loading manifest");
                Self::parse_at(&content, path.to_native())
            }
            None => {
                tracing::debug!(%path, "No manifest found; running zero layers");
                Ok(Self::empty())
            }
        }
    }

    /// Parse and validate manifest TOML.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_at(content, PathBuf::from(SynapsePath::Manifest.as_str()))
    }

    fn parse_at(content: &str, path: PathBuf) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content).map_err(|e| Error::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        manifest
            .validate()
            .map_err(|message| Error::Manifest { path, message })?;
        Ok(manifest)
    }

    /// Check structural invariants.
    ///
    /// - names are non-empty and unique
    /// - effective positions (explicit `order` or list index) are unique
    /// - the version parses and its major is supported
    pub fn validate(&self) -> std::result::Result<(), String> {
        let version = parse_version(&self.version)?;
        if version.major > SUPPORTED_MAJOR {
            return Err(format!(
                "manifest version {} is newer than supported major {SUPPORTED_MAJOR}",
                self.version
            ));
        }

        let mut names = HashSet::new();
        let mut positions: HashMap<i64, &str> = HashMap::new();
        for (index, entry) in self.layers.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(format!("layer #{index} has an empty name"));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(format!("duplicate layer name '{}'", entry.name));
            }
            let position = entry.order.unwrap_or(index as i64);
            if let Some(other) = positions.insert(position, entry.name.as_str()) {
                return Err(format!(
                    "layers '{other}' and '{}' both resolve to position {position}",
                    entry.name
                ));
            }
        }
        Ok(())
    }

    /// Enabled layers in execution order.
    pub fn ordered_layers(&self) -> Vec<&LayerEntry> {
        let mut ordered: Vec<(i64, &LayerEntry)> = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.order.unwrap_or(index as i64), entry))
            .collect();
        ordered.sort_by_key(|(position, _)| *position);
        ordered
            .into_iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(_, entry)| entry)
            .collect()
    }

    /// The manifest as a JSON mapping, as exposed to layers.
    pub fn to_mapping(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Parse a version tag, accepting the short `2` and `2.0` forms.
fn parse_version(tag: &str) -> std::result::Result<Version, String> {
    let tag = tag.trim();
    let padded = match tag.matches('.').count() {
        0 => format!("{tag}.0.0"),
        1 => format!("{tag}.0"),
        _ => tag.to_string(),
    };
    Version::parse(&padded).map_err(|e| format!("invalid manifest version '{tag}': {e}"))
}
