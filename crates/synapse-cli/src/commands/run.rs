//! Run command implementation

use std::path::Path;

use colored::Colorize;
use synapse_core::TurnOutcome;

use super::require_runtime;
use crate::error::Result;

/// Process `prompt` as one turn and print the composed context.
pub fn run_turn(cwd: &Path, prompt: &str, session_id: Option<&str>, json: bool) -> Result<()> {
    let mut runtime = require_runtime(cwd, session_id)?;
    let turn = runtime.process(prompt)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turn)?);
        return Ok(());
    }

    if !turn.run.text.is_empty() {
        println!("{}", turn.run.text);
    }
    for line in warnings(&turn) {
        eprintln!("{} {}", "warning:".yellow().bold(), line);
    }
    Ok(())
}

/// Human-readable notes about everything that went wrong without failing the turn.
fn warnings(turn: &TurnOutcome) -> Vec<String> {
    let mut lines: Vec<String> = turn
        .run
        .errors
        .iter()
        .map(|failure| format!("layer '{}' failed: {}", failure.layer, failure.message))
        .collect();
    if let Some(reason) = &turn.session_degraded {
        lines.push(format!("stored session unusable, started fresh: {reason}"));
    }
    if let Some(reason) = &turn.persist_warning {
        lines.push(format!("session not saved: {reason}"));
    }
    lines
}
