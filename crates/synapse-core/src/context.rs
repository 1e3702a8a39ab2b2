//! Normalized layer context
//!
//! Every layer sees the same fully-populated [`Context`] shape regardless of
//! which inputs the caller supplied. Construction is pure: inputs are cloned,
//! never mutated, and identical inputs always produce equal contexts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::session::Session;
use crate::{Error, Result};

/// Output recorded for one executed layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOutput {
    /// Layer name as declared in the manifest
    pub layer: String,
    /// Fragment the layer contributed (empty when it failed)
    #[serde(default)]
    pub output: String,
}

impl LayerOutput {
    pub fn new(layer: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            output: output.into(),
        }
    }
}

/// Engine configuration as seen by layers
///
/// Recognized options are typed fields; any other caller-supplied key is
/// kept in `extra` and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextConfig {
    /// Root directory for session, manifest and layer data
    pub synapse_path: PathBuf,

    /// Manifest mapping for this run
    #[serde(default)]
    pub manifest: Map<String, Value>,

    /// Developer mode toggle, omitted from the wire shape when off
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub devmode: bool,

    /// Unrecognized caller-supplied keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical per-invocation context
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub prompt: String,
    pub session: Session,
    pub config: ContextConfig,
    pub previous_layers: Vec<LayerOutput>,
}

/// Raw inputs to [`build_layer_context`]; every field is optional
#[derive(Debug, Clone, Default)]
pub struct ContextInput {
    pub prompt: Option<String>,
    pub session: Option<Session>,
    /// Caller-supplied configuration blob (e.g. from `config.toml`)
    pub config: Option<Map<String, Value>>,
    pub synapse_path: Option<PathBuf>,
    pub manifest: Option<Map<String, Value>>,
    pub previous_layers: Option<Vec<LayerOutput>>,
}

impl ContextInput {
    pub fn new(synapse_path: impl Into<PathBuf>) -> Self {
        Self {
            synapse_path: Some(synapse_path.into()),
            ..Self::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_manifest(mut self, manifest: Map<String, Value>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_previous_layers(mut self, previous_layers: Vec<LayerOutput>) -> Self {
        self.previous_layers = Some(previous_layers);
        self
    }
}

/// Build the normalized context handed to every layer.
///
/// `synapse_path` is mandatory. The explicit `synapse_path` and `manifest`
/// inputs always replace same-named keys inside the `config` blob; an absent
/// `manifest` input yields an empty mapping even if the blob carried one.
pub fn build_layer_context(input: &ContextInput) -> Result<Context> {
    let synapse_path = input
        .synapse_path
        .clone()
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or_else(|| Error::config("synapsePath is required"))?;

    let mut extra = input.config.clone().unwrap_or_default();
    extra.remove("synapsePath");
    extra.remove("manifest");

    let devmode = match extra.remove("devmode") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(enabled)) => enabled,
        Some(other) => {
            return Err(Error::config(format!(
                "devmode must be a boolean, got {other}"
            )));
        }
    };

    Ok(Context {
        prompt: input.prompt.clone().unwrap_or_default(),
        session: input.session.clone().unwrap_or_default(),
        config: ContextConfig {
            synapse_path,
            manifest: input.manifest.clone().unwrap_or_default(),
            devmode,
            extra,
        },
        previous_layers: input.previous_layers.clone().unwrap_or_default(),
    })
}
