//! [`TestSynapse`] builder for engine and CLI test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

/// A temporary working directory with helpers for laying out a `.synapse`
/// root.
///
/// # Example
///
/// ```rust,no_run
/// use synapse_test_utils::TestSynapse;
///
/// let synapse = TestSynapse::new().with_root();
/// synapse.write_file("global.md", "Always run the tests.");
/// synapse.write_manifest(r#"
/// [[layers]]
/// name = "global"
/// kind = "file"
/// settings = { path = "global.md" }
/// "#);
/// synapse.assert_file_exists(".synapse/manifest.toml");
/// ```
pub struct TestSynapse {
    temp_dir: TempDir,
}

impl Default for TestSynapse {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSynapse {
    /// Create an empty temporary working directory (no `.synapse` yet).
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Create the `.synapse` directory.
    pub fn with_root(self) -> Self {
        fs::create_dir_all(self.synapse_path()).unwrap();
        self
    }

    /// The working directory.
    pub fn cwd(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The `.synapse` directory inside the working directory.
    pub fn synapse_path(&self) -> PathBuf {
        self.cwd().join(".synapse")
    }

    /// The sessions directory.
    pub fn sessions_dir(&self) -> PathBuf {
        self.synapse_path().join("sessions")
    }

    /// Write `.synapse/manifest.toml`.
    pub fn write_manifest(&self, content: &str) {
        self.write_file("manifest.toml", content);
    }

    /// Write a file relative to `.synapse`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.synapse_path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
    }

    /// Write a raw session record.
    pub fn write_session(&self, session_id: &str, record: &Value) {
        self.write_file(
            &format!("sessions/{session_id}.json"),
            &serde_json::to_string_pretty(record).unwrap(),
        );
    }

    /// Read a session record as JSON, or `None` if it was never written.
    pub fn read_session(&self, session_id: &str) -> Option<Value> {
        let path = self.sessions_dir().join(format!("{session_id}.json"));
        let content = fs::read_to_string(path).ok()?;
        Some(serde_json::from_str(&content).unwrap())
    }

    /// Prompt counter of a stored session, or `None` if absent.
    pub fn prompt_count(&self, session_id: &str) -> Option<u64> {
        self.read_session(session_id)?["prompt_count"].as_u64()
    }

    /// Assert that `path` (relative to the working directory) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.cwd().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the working directory) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.cwd().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
