//! Normalized path handling for cross-platform compatibility

use std::path::{Component, Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Paths are stored with forward slashes and converted to the
/// platform-native form only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let joined = if self.inner.is_empty() {
            segment
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Check that `value` can be used as a single file name component.
///
/// Session ids become file names, so anything that could escape the
/// sessions directory or produce a hidden/temp file is rejected.
pub fn validate_path_identifier(value: &str, label: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{label} must not be empty"));
    }
    if value.len() > 128 {
        return Err(format!("{label} must be at most 128 characters"));
    }
    if value.starts_with('.') {
        return Err(format!("{label} must not start with '.'"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(format!("{label} contains invalid character {c:?}"));
    }
    Ok(())
}

/// Check that `value` is a relative path that stays inside its base directory.
pub fn validate_relative_path(value: &str) -> Result<(), String> {
    let path = Path::new(value);
    if value.is_empty() {
        return Err("path must not be empty".to_string());
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(format!("'{value}' must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("'{value}' must be relative"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_and_parent_are_inverse() {
        let base = NormalizedPath::new("/repo/.synapse");
        let joined = base.join("sessions");
        assert_eq!(joined.as_str(), "/repo/.synapse/sessions");
        assert_eq!(joined.parent(), Some(base));
    }

    #[test]
    fn backslashes_are_normalized() {
        let path = NormalizedPath::new("C:\\repo\\.synapse");
        assert_eq!(path.as_str(), "C:/repo/.synapse");
    }

    #[test]
    fn extension_ignores_dotfiles() {
        assert_eq!(NormalizedPath::new("/a/.synapse").extension(), None);
        assert_eq!(NormalizedPath::new("/a/s1.json").extension(), Some("json"));
    }

    #[test]
    fn identifier_rejects_traversal() {
        assert!(validate_path_identifier("abc-123", "Session id").is_ok());
        assert!(validate_path_identifier("../etc", "Session id").is_err());
        assert!(validate_path_identifier("a/b", "Session id").is_err());
        assert!(validate_path_identifier("", "Session id").is_err());
    }

    #[test]
    fn relative_path_stays_inside() {
        assert!(validate_relative_path("rules/global.md").is_ok());
        assert!(validate_relative_path("../secret").is_err());
        assert!(validate_relative_path("/etc/passwd").is_err());
    }
}
