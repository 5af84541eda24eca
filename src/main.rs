//! research-nav binary entry point.
//!
//! Loads `.env`, initializes logging, parses arguments, and dispatches to
//! the command layer. Exit codes: 0 on success, 1 on error, 130 on
//! interrupt.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use research_nav::cli::{self, Cli};

/// Exit code for a run interrupted by Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "research_nav=debug" } else { "research_nav=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // Missing .env is fine; the environment may carry the keys directly.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = tokio::select! {
        result = cli::execute(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted");
            std::process::exit(EXIT_INTERRUPTED);
        }
    };

    if let Err(e) = outcome {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}
