//! CLI commands for boatrace-scraper.
//!
//! `collect` downloads race pages from boatrace.jp; `extract` turns the
//! downloaded folders into one CSV.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::dataset::{build_dataset, write_csv};
use crate::retry::RetryPolicy;
use crate::scraper::{CollectOptions, Collector, Fetcher, HtmlStore, RateLimiter};

#[derive(Parser)]
#[command(name = "boatrace-scraper")]
#[command(version, about = "Collect boatrace.jp race pages and extract a per-lane CSV", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the grade schedule pages and download race card, result and odds pages
    Collect {
        /// Download directory override
        #[arg(long)]
        html_dir: Option<PathBuf>,

        /// Schedule page to start from (repeatable); replaces the configured seeds
        #[arg(short, long = "seed")]
        seeds: Vec<String>,

        /// Skip races whose three pages are already downloaded
        #[arg(long)]
        skip_existing: bool,

        /// List discovered races without downloading them
        #[arg(long)]
        dry_run: bool,
    },

    /// Build the CSV dataset from downloaded race folders
    Extract {
        /// Download directory override
        #[arg(long)]
        html_dir: Option<PathBuf>,

        /// Output CSV path override
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Log and skip race folders that fail to parse
        #[arg(long)]
        skip_malformed: bool,
    },
}

/// Run the collector.
pub async fn run_collect(
    html_dir: Option<PathBuf>,
    seeds: Vec<String>,
    skip_existing: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;

    if let Some(dir) = html_dir {
        config.storage.html_dir = dir.to_string_lossy().to_string();
    }
    if !seeds.is_empty() {
        config.collector.seed_urls = seeds;
    }

    tracing::info!("Downloading into: {}", config.storage.html_dir);

    let fetcher = Fetcher::new(&config.collector, RetryPolicy::from(&config.retry))?;
    let limiter = RateLimiter::from_config(&config.collector);
    let store = HtmlStore::new(&config.storage.html_dir);
    let collector = Collector::new(fetcher, limiter, store, &config.collector.base_url);

    let options = CollectOptions {
        skip_existing,
        dry_run,
    };
    let summary = collector.run(&config.collector.seed_urls, options).await?;

    eprintln!(
        "Tournaments: {}, races: {}, downloaded: {}, skipped: {}",
        summary.tournaments, summary.races, summary.downloaded, summary.skipped
    );

    Ok(())
}

/// Run the extractor.
pub fn run_extract(
    html_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    skip_malformed: bool,
) -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let html_dir = html_dir.unwrap_or_else(|| PathBuf::from(&config.storage.html_dir));
    let output = output.unwrap_or_else(|| PathBuf::from(&config.storage.output_csv));

    let store = HtmlStore::new(html_dir);
    let (rows, summary) = build_dataset(&store, skip_malformed)?;

    write_csv(&rows, &output)?;
    tracing::info!("Wrote {} rows to {}", rows.len(), output.display());

    eprintln!(
        "Races: {}, rows: {}, failed: {}",
        summary.races, summary.rows, summary.failed
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collect_flags() {
        let cli = Cli::try_parse_from([
            "boatrace-scraper",
            "collect",
            "--skip-existing",
            "--seed",
            "https://www.boatrace.jp/owpc/pc/race/gradesch?year=2023&hcd=01",
        ])
        .unwrap();

        match cli.command {
            Commands::Collect {
                html_dir,
                seeds,
                skip_existing,
                dry_run,
            } => {
                assert!(html_dir.is_none());
                assert_eq!(seeds.len(), 1);
                assert!(skip_existing);
                assert!(!dry_run);
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn test_parse_extract_flags() {
        let cli = Cli::try_parse_from([
            "boatrace-scraper",
            "extract",
            "--html-dir",
            "pages",
            "-o",
            "out.csv",
            "--skip-malformed",
        ])
        .unwrap();

        match cli.command {
            Commands::Extract {
                html_dir,
                output,
                skip_malformed,
            } => {
                assert_eq!(html_dir, Some(PathBuf::from("pages")));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(skip_malformed);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_run_extract_on_fixture() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("boat-race.csv");
        let html_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/html");

        run_extract(Some(html_dir), Some(output.clone()), false).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content.lines().count(), 7);
    }
}
