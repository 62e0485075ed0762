//! Boatrace scraper
//!
//! Collects race pages from boatrace.jp and extracts a per-lane CSV dataset.

mod cli;
mod config;
mod dataset;
mod normalize;
mod retry;
mod scraper;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boatrace_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            html_dir,
            seeds,
            skip_existing,
            dry_run,
        } => cli::run_collect(html_dir, seeds, skip_existing, dry_run).await,
        Commands::Extract {
            html_dir,
            output,
            skip_malformed,
        } => cli::run_extract(html_dir, output, skip_malformed),
    }
}
