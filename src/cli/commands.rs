//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Terminal output goes
//! through the emit helper at the bottom of the module.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::format_push_string)]

use anyhow::Context;
use tracing::info;

use crate::agent::{AgentState, Orchestrator};
use crate::cli::parser::{Cli, Commands, ConfigCommands};
use crate::config::Settings;

/// Parameters for the run command.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// The research question.
    pub query: String,
    /// Knowledge-base directory, if any.
    pub kb: Option<std::path::PathBuf>,
    /// Step budget.
    pub max_steps: usize,
    /// Where to write the report, if anywhere.
    pub output: Option<std::path::PathBuf>,
    /// Force an index rebuild.
    pub rebuild_index: bool,
}

/// Dispatches a parsed CLI invocation.
///
/// # Errors
///
/// Returns an error for configuration problems, index-build failures, and
/// report-write failures; per-step agent failures degrade into fallbacks
/// and do not surface here.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            query,
            kb,
            max_steps,
            output,
            rebuild_index,
        } => {
            run_agent(RunParams {
                query,
                kb,
                max_steps,
                output,
                rebuild_index,
            })
            .await
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => config_show(),
            ConfigCommands::Check => config_check(),
        },
    }
}

/// Runs the research agent and prints (and optionally writes) the brief.
async fn run_agent(params: RunParams) -> anyhow::Result<()> {
    let settings = Settings::builder()
        .from_env()
        .max_steps(params.max_steps)
        .build()
        .context("failed to load configuration")?;

    if let Some(ref kb) = params.kb {
        anyhow::ensure!(
            kb.exists(),
            "knowledge base path does not exist: {}",
            kb.display()
        );
    }

    let mut orchestrator = Orchestrator::from_settings(settings)
        .context("failed to initialize agent")?
        .with_force_rebuild(params.rebuild_index);

    let state = orchestrator
        .run(&params.query, params.kb)
        .await
        .context("research run failed")?;

    if let Some(ref report) = state.final_report {
        if let Some(ref path) = params.output {
            std::fs::write(path, report)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        emit(report);
    }

    emit(&run_summary(&state));
    Ok(())
}

/// Formats the end-of-run summary block.
fn run_summary(state: &AgentState) -> String {
    let errors = state.tool_calls.iter().filter(|c| c.is_error).count();
    format!(
        "\n---\nRun summary: {} steps, {} internal sources, {} external sources, {} failed tool calls",
        state.step,
        state.internal_evidence.len(),
        state.external_evidence.len(),
        errors,
    )
}

/// Prints the resolved configuration.
fn config_show() -> anyhow::Result<()> {
    let settings = Settings::builder()
        .from_env()
        .openai_api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
        .build()?;

    let mut out = String::new();
    out.push_str("Research Navigator Configuration\n\n");
    out.push_str("API:\n");
    out.push_str(&format!(
        "  OpenAI API key: {}\n",
        set_or_not(!settings.openai_api_key.is_empty())
    ));
    if let Some(ref url) = settings.openai_base_url {
        out.push_str(&format!("  OpenAI base URL: {url}\n"));
    }
    out.push_str(&format!(
        "  Tavily API key: {}\n",
        set_or_not(settings.tavily_api_key.as_deref().is_some_and(|k| !k.is_empty()))
    ));
    out.push_str("\nLLM:\n");
    out.push_str(&format!("  Model: {}\n", settings.llm_model));
    out.push_str(&format!("  Temperature: {}\n", settings.llm_temperature));
    out.push_str("\nEmbedding:\n");
    out.push_str(&format!("  Model: {}\n", settings.embedding_model));
    out.push_str("\nAgent:\n");
    out.push_str(&format!("  Max steps: {}\n", settings.max_steps));
    out.push_str(&format!("  Top-k results: {}\n", settings.top_k));
    out.push_str("\nChunking:\n");
    out.push_str(&format!("  Chunk size: {}\n", settings.chunk_size));
    out.push_str(&format!("  Chunk overlap: {}\n", settings.chunk_overlap));
    out.push_str("\nStorage:\n");
    out.push_str(&format!("  Index directory: {}\n", settings.index_dir.display()));

    emit(&out);
    Ok(())
}

/// Validates API keys; errors when any are missing.
fn config_check() -> anyhow::Result<()> {
    let settings = Settings::builder()
        .from_env()
        .openai_api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
        .build()?;

    let missing = settings.missing_api_keys();
    if missing.is_empty() {
        emit("All API keys configured");
        Ok(())
    } else {
        anyhow::bail!(
            "missing API keys: {}. Set them in .env or the environment.",
            missing.join(", ")
        )
    }
}

const fn set_or_not(set: bool) -> &'static str {
    if set { "set" } else { "not set" }
}

/// Writes a line to stdout. The only stdout sink in the crate.
#[allow(clippy::print_stdout)]
fn emit(text: &str) {
    println!("{text}");
}
