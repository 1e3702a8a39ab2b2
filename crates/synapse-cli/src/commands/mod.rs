//! Command implementations for synapse-cli

pub mod hook;
pub mod run;
pub mod session;
pub mod status;

use std::path::Path;

use synapse_core::{HookRuntime, resolve_hook_runtime};
use synapse_fs::SynapsePath;

use crate::error::{CliError, Result};

pub use hook::run_hook;
pub use run::run_turn;
pub use session::{run_session_reset, run_session_show};
pub use status::run_status;

/// Resolve the runtime for `cwd`, failing when there is no `.synapse` root.
fn require_runtime(cwd: &Path, session_id: Option<&str>) -> Result<HookRuntime> {
    resolve_hook_runtime(Some(cwd), session_id).ok_or_else(|| {
        CliError::user(format!(
            "No {} directory in {}",
            SynapsePath::Root,
            cwd.display()
        ))
    })
}
