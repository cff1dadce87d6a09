//! mcorpus - builds a CSV corpus of Java methods from popular GitHub repositories.
//!
//! Configuration comes from `config.json` in the user config directory, a
//! local `.env` file and `MCORPUS_*` / `GITHUB_TOKEN` environment variables.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use method_corpus_ops::{Config, MiningContext};

mod summary;

/// Mine method declarations from permissively licensed Java repositories.
#[derive(Parser, Debug)]
#[command(
    name = "mcorpus",
    author,
    version,
    about = "Build a train/eval/test corpus of Java methods from GitHub",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // RUST_LOG wins over the flags when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    tracing::debug!(
        output = %config.output_path.display(),
        work_dir = %config.work_dir.display(),
        max_repositories = config.max_repositories,
        "Loaded configuration"
    );

    let response = MiningContext::new(config)
        .run()
        .await
        .context("Corpus run failed")?;

    if !cli.quiet {
        summary::print(&response, cli.verbose);
    }

    Ok(())
}
