//! Error types for synapse-core

use std::path::PathBuf;

/// Result type for synapse-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in synapse-core operations
///
/// `Config` and `Manifest` abort a run before any layer executes.
/// Ordinary layer failures are not errors at this level: they are recorded
/// in the run outcome. `LayerFailed` is only produced by strict manifests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid input to context construction
    #[error("Invalid context configuration: {message}")]
    Config { message: String },

    /// Unreadable or malformed manifest
    #[error("Invalid manifest at {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// A layer failed while the manifest requested strict execution
    #[error("Layer '{layer}' failed: {message}")]
    LayerFailed { layer: String, message: String },

    /// The session record could not be written
    #[error("Failed to persist session '{session_id}': {message}")]
    Persistence { session_id: String, message: String },

    /// Filesystem error from synapse-fs
    #[error(transparent)]
    Fs(#[from] synapse_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn persistence(session_id: impl Into<String>, message: impl ToString) -> Self {
        Self::Persistence {
            session_id: session_id.into(),
            message: message.to_string(),
        }
    }
}
