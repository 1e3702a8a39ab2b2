//! Hook entry point
//!
//! The host runs this before every turn and treats any output on stdout as
//! context to inject, so problems are logged to stderr and never surface as
//! a failed hook.

use std::io::Write;

use synapse_core::{HookInput, HookPayload, resolve_from_input};

use crate::error::Result;

/// Process one hook invocation from its raw stdin `input`, writing the
/// payload line to `out`.
pub fn run_hook(input: &str, out: &mut impl Write) -> Result<()> {
    let input = match HookInput::parse(input) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable hook input");
            return Ok(());
        }
    };

    let Some(mut runtime) = resolve_from_input(&input) else {
        return Ok(());
    };

    let prompt = input.prompt.as_deref().unwrap_or_default();
    let payload = match runtime.process(prompt) {
        Ok(turn) => turn.payload,
        Err(e) => {
            tracing::warn!(error = %e, "Context assembly failed; injecting nothing");
            HookPayload::default()
        }
    };

    writeln!(out, "{}", payload.to_json()?)?;
    Ok(())
}
