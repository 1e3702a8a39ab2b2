//! Status command implementation

use std::path::Path;

use colored::Colorize;
use serde_json::json;
use synapse_core::{HookRuntime, Manifest, resolve_hook_runtime};
use synapse_fs::SynapsePath;

use crate::error::Result;

/// Run the status command
pub fn run_status(path: &Path, json: bool) -> Result<()> {
    let Some(runtime) = resolve_hook_runtime(Some(path), None) else {
        if json {
            println!("{}", serde_json::to_string_pretty(&json!({ "initialized": false }))?);
        } else {
            println!("{}", "Not a Synapse project".red().bold());
            println!();
            println!(
                "Create {} to declare layers.",
                format!("{}/{}", SynapsePath::Root, SynapsePath::Manifest).cyan()
            );
        }
        return Ok(());
    };

    let manifest = runtime.engine.load_manifest()?;
    let sessions = session_summaries(&runtime)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status_json(&runtime, &manifest, &sessions))?);
        return Ok(());
    }

    println!("{}", "Synapse Status".bold());
    println!();
    println!("{}:     {}", "Root".dimmed(), runtime.synapse_path().display());
    println!("{}:  {}", "Version".dimmed(), manifest.version.cyan());
    if manifest.strict {
        println!("{}:     {}", "Mode".dimmed(), "strict".yellow());
    }
    println!();

    println!("{}:", "Layers".bold());
    let ordered = manifest.ordered_layers();
    if ordered.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for (position, entry) in ordered.iter().enumerate() {
        let kind = entry.kind();
        let marker = if runtime.engine.registry().has_kind(kind) {
            "+".green()
        } else {
            "?".yellow()
        };
        println!("  {} {}. {} ({})", marker, position + 1, entry.name.cyan(), kind);
    }
    for entry in manifest.layers.iter().filter(|entry| !entry.enabled) {
        println!("  {} {} (disabled)", "-".dimmed(), entry.name.dimmed());
    }
    println!();

    println!("{}:", "Sessions".bold());
    if sessions.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for (id, prompt_count) in &sessions {
        match prompt_count {
            Some(count) => println!("  {} {} ({} prompts)", "+".green(), id, count),
            None => println!("  {} {} ({})", "!".red(), id, "unreadable".red()),
        }
    }

    Ok(())
}

/// Stored session ids with their prompt counts; `None` for unreadable records.
fn session_summaries(runtime: &HookRuntime) -> Result<Vec<(String, Option<u64>)>> {
    let store = runtime.store();
    Ok(store
        .list()?
        .into_iter()
        .map(|id| {
            let load = store.resolve(Some(&id));
            let count = (!load.is_degraded()).then(|| load.session().prompt_count);
            (id, count)
        })
        .collect())
}

fn status_json(
    runtime: &HookRuntime,
    manifest: &Manifest,
    sessions: &[(String, Option<u64>)],
) -> serde_json::Value {
    let layers: Vec<_> = manifest
        .ordered_layers()
        .iter()
        .map(|entry| {
            json!({
                "name": entry.name,
                "kind": entry.kind(),
                "registered": runtime.engine.registry().has_kind(entry.kind()),
            })
        })
        .collect();
    let disabled: Vec<_> = manifest
        .layers
        .iter()
        .filter(|entry| !entry.enabled)
        .map(|entry| entry.name.as_str())
        .collect();
    let sessions: Vec<_> = sessions
        .iter()
        .map(|(id, prompt_count)| json!({ "id": id, "prompt_count": prompt_count }))
        .collect();

    json!({
        "initialized": true,
        "root": runtime.synapse_path(),
        "version": manifest.version,
        "strict": manifest.strict,
        "layers": layers,
        "disabled": disabled,
        "sessions": sessions,
    })
}
