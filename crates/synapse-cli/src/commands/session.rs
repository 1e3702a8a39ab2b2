//! Session subcommands

use std::path::Path;

use colored::Colorize;
use synapse_core::SessionLoad;

use super::require_runtime;
use crate::error::{CliError, Result};

/// Print the stored record for `id` as pretty JSON.
pub fn run_session_show(cwd: &Path, id: &str) -> Result<()> {
    let runtime = require_runtime(cwd, Some(id))?;
    match runtime.session_load() {
        SessionLoad::Loaded(session) => {
            println!("{}", serde_json::to_string_pretty(session)?);
            Ok(())
        }
        SessionLoad::Degraded { reason, .. } => Err(CliError::user(format!(
            "Session '{id}' is unreadable: {reason}"
        ))),
        SessionLoad::Fresh(_) | SessionLoad::Transient(_) => {
            Err(CliError::user(format!("No stored session '{id}'")))
        }
    }
}

/// Delete the stored record for `id`.
pub fn run_session_reset(cwd: &Path, id: &str) -> Result<()> {
    let runtime = require_runtime(cwd, None)?;
    if runtime.store().delete(id)? {
        println!("{} Reset session {}", "OK".green().bold(), id.cyan());
    } else {
        println!("{} No stored session {}", "-".dimmed(), id.cyan());
    }
    Ok(())
}
