//! Synapse CLI
//!
//! Runs the context-assembly engine as an assistant hook and offers a few
//! commands for inspecting a `.synapse` directory.

mod cli;
mod commands;
mod error;

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, SessionAction};
use error::Result;

/// Environment variable holding the log filter
const LOG_ENV: &str = "SYNAPSE_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.cwd),
        None => {
            println!("{} layered context for AI assistants", "synapse".green().bold());
            println!();
            println!("Run {} for available commands.", "synapse --help".cyan());
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout is reserved for command output and the hook payload.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init();
    tracing::debug!("Logging initialised");
}

fn execute_command(cmd: Commands, cwd: Option<PathBuf>) -> Result<()> {
    match cmd {
        Commands::Hook => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            commands::run_hook(&input, &mut io::stdout().lock())
        }
        Commands::Run {
            prompt,
            session,
            json,
        } => commands::run_turn(&working_dir(cwd)?, &prompt, session.as_deref(), json),
        Commands::Status { json } => commands::run_status(&working_dir(cwd)?, json),
        Commands::Session { action } => {
            let cwd = working_dir(cwd)?;
            match action {
                SessionAction::Show { id } => commands::run_session_show(&cwd, &id),
                SessionAction::Reset { id } => commands::run_session_reset(&cwd, &id),
            }
        }
    }
}

fn working_dir(cwd: Option<PathBuf>) -> Result<PathBuf> {
    match cwd {
        Some(cwd) => Ok(cwd),
        None => Ok(std::env::current_dir()?),
    }
}
