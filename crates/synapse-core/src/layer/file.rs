//! Layer that contributes the content of a file under the Synapse root

use std::fs;

use synapse_fs::validate_relative_path;

use super::{Layer, LayerError, LayerInvocation};

/// Reads `settings.path` (relative to the Synapse root) and contributes its
/// trimmed content.
///
/// With `settings.devmode_only = true` the layer stays silent unless the
/// context has `devmode` enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLayer;

impl Layer for FileLayer {
    fn execute(&self, invocation: &mut LayerInvocation<'_>) -> Result<String, LayerError> {
        if invocation.setting_bool("devmode_only")?.unwrap_or(false) && !invocation.config.devmode {
            return Ok(String::new());
        }

        let relative = invocation.setting_str("path")?;
        validate_relative_path(relative).map_err(|message| LayerError::invalid("path", message))?;

        let path = invocation.config.synapse_path.join(relative);
        let content = fs::read_to_string(&path).map_err(|source| LayerError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use serde_json::{Map, Value, json};
    use tempfile::TempDir;

    fn run(config: &ContextConfig, settings: Value) -> Result<String, LayerError> {
        let settings = match settings {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut state = Value::Null;
        let mut invocation = LayerInvocation {
            name: "global",
            prompt: "",
            prompt_count: 0,
            config,
            settings: &settings,
            previous_layers: &[],
            state: &mut state,
        };
        FileLayer.execute(&mut invocation)
    }

    fn config_for(temp: &TempDir, devmode: bool) -> ContextConfig {
        ContextConfig {
            synapse_path: temp.path().to_path_buf(),
            manifest: Map::new(),
            devmode,
            extra: Map::new(),
        }
    }

    #[test]
    fn reads_trimmed_file_content() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("global.md"), "\nAlways test.\n\n").unwrap();

        let output = run(&config_for(&temp, false), json!({ "path": "global.md" })).unwrap();
        assert_eq!(output, "Always test.");
    }

    #[test]
    fn missing_file_is_a_layer_error() {
        let temp = TempDir::new().unwrap();
        let err = run(&config_for(&temp, false), json!({ "path": "absent.md" })).unwrap_err();
        assert!(matches!(err, LayerError::Io { .. }));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let temp = TempDir::new().unwrap();
        let err = run(&config_for(&temp, false), json!({ "path": "../outside.md" })).unwrap_err();
        assert!(matches!(err, LayerError::InvalidSetting { .. }));
    }

    #[test]
    fn devmode_only_files_are_skipped_outside_devmode() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("dev.md"), "debug hints").unwrap();
        let settings = json!({ "path": "dev.md", "devmode_only": true });

        assert_eq!(run(&config_for(&temp, false), settings.clone()).unwrap(), "");
        assert_eq!(run(&config_for(&temp, true), settings).unwrap(), "debug hints");
    }
}
