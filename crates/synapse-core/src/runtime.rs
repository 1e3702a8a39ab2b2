//! Hook runtime resolution
//!
//! Locates the `.synapse` root for a working directory and wires up the
//! session store and engine for one turn. A missing root is not an error:
//! the host may probe every directory before every turn.

use std::path::{Path, PathBuf};

use serde::Serialize;
use synapse_fs::{NormalizedPath, SynapsePath};

use crate::config::ConfigResolver;
use crate::engine::{RunOutcome, SynapseEngine};
use crate::hook::{HookInput, HookPayload};
use crate::session::{Session, SessionLoad, SessionStore};
use crate::Result;

/// Everything needed to run and persist one turn
#[derive(Debug)]
pub struct HookRuntime {
    pub engine: SynapseEngine,
    pub session: Session,
    load: SessionLoad,
    store: SessionStore,
    session_id: Option<String>,
    synapse_path: PathBuf,
    global_config_dir: Option<PathBuf>,
}

/// Result of processing one turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub payload: HookPayload,
    pub run: RunOutcome,
    /// Why the session could not be saved; the turn still succeeded
    pub persist_warning: Option<String>,
    /// Why the stored session could not be used, if it was replaced
    pub session_degraded: Option<String>,
}

/// Resolve the runtime for `cwd`, or `None` when no `.synapse` root exists.
pub fn resolve_hook_runtime(cwd: Option<&Path>, session_id: Option<&str>) -> Option<HookRuntime> {
    let cwd = cwd?;
    let cwd = dunce::canonicalize(cwd).unwrap_or_else(|_| cwd.to_path_buf());
    let synapse_path = cwd.join(SynapsePath::Root.as_str());
    if !synapse_path.is_dir() {
        tracing::debug!(cwd = %cwd.display(), "No .synapse root; hook not applicable");
        return None;
    }

    let store = SessionStore::new(
        NormalizedPath::new(&synapse_path).join(SynapsePath::SessionsDir.as_str()),
    );
    let session_id = session_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    let load = store.resolve(session_id.as_deref());
    let engine = SynapseEngine::new(&synapse_path);

    Some(HookRuntime {
        engine,
        session: load.session().clone(),
        load,
        store,
        session_id,
        synapse_path,
        global_config_dir: None,
    })
}

/// Resolve the runtime described by a host hook input.
pub fn resolve_from_input(input: &HookInput) -> Option<HookRuntime> {
    resolve_hook_runtime(input.cwd.as_deref(), input.session_id.as_deref())
}

impl HookRuntime {
    pub fn synapse_path(&self) -> &Path {
        &self.synapse_path
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn session_load(&self) -> &SessionLoad {
        &self.load
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Use `dir` instead of the platform config directory for global config.
    pub fn set_global_config_dir(&mut self, dir: impl Into<PathBuf>) {
        self.global_config_dir = Some(dir.into());
    }

    fn config_resolver(&self) -> ConfigResolver {
        match &self.global_config_dir {
            Some(dir) => {
                ConfigResolver::with_global_config_dir(self.synapse_path.as_path(), dir.clone())
            }
            None => ConfigResolver::new(self.synapse_path.as_path()),
        }
    }

    /// Run one turn and persist the session.
    ///
    /// Configuration and manifest problems are fatal. A failed session write
    /// is reported in [`TurnOutcome::persist_warning`] and the composed text
    /// is still returned.
    pub fn process(&mut self, prompt: &str) -> Result<TurnOutcome> {
        let config = self.config_resolver().resolve()?;
        let run = self.engine.process(prompt, self.session.clone(), config)?;

        let persist_warning = match self.store.persist(&run.session, self.session_id.as_deref()) {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Session not persisted; continuing with this turn");
                Some(e.to_string())
            }
        };
        self.session = run.session.clone();

        Ok(TurnOutcome {
            payload: HookPayload::wrap(run.text.as_str()),
            session_degraded: self.load.degraded_reason().map(str::to_string),
            run,
            persist_warning,
        })
    }
}
