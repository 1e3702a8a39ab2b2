//! On-disk session storage

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use synapse_fs::{ConfigStore, FileLock, NormalizedPath, io, validate_path_identifier};

use super::{Session, SessionLoad};
use crate::{Error, Result};

const SESSION_EXTENSION: &str = "json";

/// Reads and writes session records in a sessions directory
///
/// Records live at `<sessions_dir>/<id>.json`. Writes are atomic and guarded
/// by a non-blocking exclusive lock so that two racing turns fail fast
/// instead of silently overwriting each other's prompt counter.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions_dir: NormalizedPath,
    store: ConfigStore,
}

impl SessionStore {
    pub fn new(sessions_dir: impl Into<NormalizedPath>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
            store: ConfigStore::new(),
        }
    }

    pub fn sessions_dir(&self) -> &NormalizedPath {
        &self.sessions_dir
    }

    /// Path of the record for `session_id`, validating the id first.
    pub fn session_path(&self, session_id: &str) -> std::result::Result<NormalizedPath, String> {
        validate_path_identifier(session_id, "Session id")?;
        Ok(self
            .sessions_dir
            .join(&format!("{session_id}.{SESSION_EXTENSION}")))
    }

    /// Resolve a session id to a session, without touching disk for writes.
    pub fn resolve(&self, session_id: Option<&str>) -> SessionLoad {
        let Some(session_id) = session_id.filter(|id| !id.trim().is_empty()) else {
            return SessionLoad::Transient(Session::default());
        };

        let path = match self.session_path(session_id) {
            Ok(path) => path,
            Err(reason) => {
                tracing::warn!(session_id, %reason, "Rejecting session id; using a fresh session");
                return SessionLoad::Degraded {
                    session: Session::default(),
                    reason,
                };
            }
        };

        match self.store.load_if_exists::<Session>(&path) {
            Ok(Some(session)) => {
                tracing::debug!(%path, prompt_count = session.prompt_count, "Loaded session");
                SessionLoad::Loaded(session)
            }
            Ok(None) => {
                tracing::debug!(%path, "No session record yet");
                SessionLoad::Fresh(Session::default())
            }
            Err(e) => {
                tracing::warn!(%path, error = %e, "Session record unusable; using a fresh session");
                SessionLoad::Degraded {
                    session: Session::default(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Persist `session` under `session_id`.
    ///
    /// Returns the written path, or `None` when no id was given (transient
    /// sessions are never written). An existing record that cannot be parsed
    /// is moved aside to `<id>.json.bak` (or a timestamped `.bak` when that
    /// name is taken) rather than overwritten, and a record with a higher
    /// prompt counter than `session` is never replaced.
    pub fn persist(
        &self,
        session: &Session,
        session_id: Option<&str>,
    ) -> Result<Option<NormalizedPath>> {
        let Some(session_id) = session_id.filter(|id| !id.trim().is_empty()) else {
            return Ok(None);
        };

        let path = self
            .session_path(session_id)
            .map_err(|reason| Error::persistence(session_id, reason))?;
        let _lock = FileLock::try_acquire(&path).map_err(|e| Error::persistence(session_id, e))?;

        match io::read_text_if_exists(&path).map_err(|e| Error::persistence(session_id, e))? {
            Some(content) => match self.store.parse::<Session>(&path, &content) {
                Ok(existing) if existing.prompt_count > session.prompt_count => {
                    return Err(Error::persistence(
                        session_id,
                        format!(
                            "stale write: record is at prompt {} but this run ended at {}",
                            existing.prompt_count, session.prompt_count
                        ),
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    let backup = backup_path(&path);
                    tracing::warn!(
                        %path,
                        backup = %backup.display(),
                        error = %e,
                        "Moving unparseable session record aside"
                    );
                    fs::rename(path.to_native(), &backup)
                        .map_err(|e| Error::persistence(session_id, e))?;
                }
            },
            None => {}
        }

        self.store
            .save(&path, session)
            .map_err(|e| Error::persistence(session_id, e))?;
        tracing::debug!(%path, prompt_count = session.prompt_count, "Persisted session");

        Ok(Some(path))
    }

    /// Delete the record for `session_id`. Returns whether a record existed.
    ///
    /// The lock sidecar goes with the record; a missing record touches
    /// nothing on disk.
    pub fn delete(&self, session_id: &str) -> Result<bool> {
        let path = self
            .session_path(session_id)
            .map_err(|reason| Error::persistence(session_id, reason))?;
        if !path.to_native().exists() {
            return Ok(false);
        }
        let lock = FileLock::try_acquire(&path).map_err(|e| Error::persistence(session_id, e))?;

        let existed = match fs::remove_file(path.to_native()) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(Error::persistence(session_id, e)),
        };
        lock.remove().map_err(|e| Error::persistence(session_id, e))?;

        if existed {
            tracing::info!(%path, "Deleted session");
        }
        Ok(existed)
    }

    /// List the ids of all stored sessions, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = self.sessions_dir.to_native();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(synapse_fs::Error::io(&dir, e).into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| synapse_fs::Error::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SESSION_EXTENSION) {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|s| s.to_str())
                && validate_path_identifier(id, "Session id").is_ok()
            {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// First unused backup name for `path`: `<file>.bak`, then timestamped.
fn backup_path(path: &NormalizedPath) -> PathBuf {
    let base = path.to_native().display().to_string();
    let plain = PathBuf::from(format!("{base}.bak"));
    if !plain.exists() {
        return plain;
    }

    let stamp = Utc::now().format("%Y%m%dT%H%M%S%6fZ").to_string();
    let mut candidate = PathBuf::from(format!("{base}.{stamp}.bak"));
    let mut attempt = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{base}.{stamp}-{attempt}.bak"));
        attempt += 1;
    }
    candidate
}
