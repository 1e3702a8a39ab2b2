//! Well-known names inside a Synapse root.

use std::path::Path;

/// Standard Synapse filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynapsePath {
    /// The `.synapse` directory (context root, relative to the working directory)
    Root,
    /// The `sessions` directory (one record per session id)
    SessionsDir,
    /// The `manifest.toml` file (layer declarations)
    Manifest,
    /// The `config.toml` file (shared engine configuration)
    Config,
    /// The `config.local.toml` file (git-ignored local overrides)
    LocalConfig,
}

impl SynapsePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => ".synapse",
            Self::SessionsDir => "sessions",
            Self::Manifest => "manifest.toml",
            Self::Config => "config.toml",
            Self::LocalConfig => "config.local.toml",
        }
    }
}

impl AsRef<Path> for SynapsePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for SynapsePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for SynapsePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
