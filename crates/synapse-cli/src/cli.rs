//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Synapse - assemble layered context for an AI assistant turn
#[derive(Parser, Debug)]
#[command(name = "synapse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Working directory containing `.synapse` (defaults to the current one)
    #[arg(long, global = true, env = "SYNAPSE_CWD")]
    pub cwd: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Hook entry point: read hook input JSON on stdin, print the payload
    ///
    /// Prints nothing when the input's `cwd` has no `.synapse` directory.
    /// Never exits non-zero because of a layer, config or manifest problem;
    /// those are logged and an empty payload is printed instead.
    Hook,

    /// Process one prompt and print the composed context
    Run {
        /// The user prompt
        #[arg(short, long)]
        prompt: String,

        /// Session id to load and persist
        #[arg(short, long)]
        session: Option<String>,

        /// Output the full turn outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective layer order and stored sessions
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Inspect or reset stored sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

/// Session subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Print a stored session record
    Show {
        /// Session id
        id: String,
    },

    /// Delete a stored session record
    Reset {
        /// Session id
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_options() {
        let cli = Cli::parse_from([
            "synapse", "run", "--prompt", "hello", "--session", "abc", "--json",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                prompt: "hello".into(),
                session: Some("abc".into()),
                json: true,
            })
        );
    }

    #[test]
    fn cwd_is_global() {
        let cli = Cli::parse_from(["synapse", "status", "--cwd", "/work"]);
        assert_eq!(cli.cwd, Some(PathBuf::from("/work")));
        assert_eq!(cli.command, Some(Commands::Status { json: false }));
    }

    #[test]
    fn parse_session_reset() {
        let cli = Cli::parse_from(["synapse", "session", "reset", "abc"]);
        assert_eq!(
            cli.command,
            Some(Commands::Session {
                action: SessionAction::Reset { id: "abc".into() }
            })
        );
    }

    #[test]
    fn run_requires_prompt() {
        assert!(Cli::try_parse_from(["synapse", "run"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
