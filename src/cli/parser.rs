//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Research Navigator: an LLM-routed research agent.
///
/// Interleaves reasoning with internal knowledge-base search and live web
/// search, then synthesizes a Markdown research brief.
#[derive(Parser, Debug)]
#[command(name = "research-nav")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the research agent on a query.
    #[command(after_help = r#"Examples:
  research-nav run "What is quantum computing?"
  research-nav run "Compare quantum and classical computing" --kb ./knowledge
  research-nav run "Latest AI developments" --max-steps 8 --output report.md
  research-nav run "Quantum vs classical" --kb ./knowledge --rebuild-index -v
"#)]
    Run {
        /// The research question to investigate.
        query: String,

        /// Path to a knowledge-base directory for internal search.
        #[arg(long, env = "NAV_KB_PATH")]
        kb: Option<PathBuf>,

        /// Maximum action steps before the agent is forced to finish.
        #[arg(long, env = "NAV_MAX_STEPS", default_value = "10")]
        max_steps: usize,

        /// Path to save the research brief (Markdown).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rebuild the similarity index even if a persisted one exists.
        #[arg(long)]
        rebuild_index: bool,
    },

    /// Configuration operations.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Display the resolved configuration.
    Show,

    /// Validate configuration and API keys; exits non-zero when keys are
    /// missing.
    Check,
}
