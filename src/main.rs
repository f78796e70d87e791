//! Trendwatch main entry point
//!
//! Command-line interface for the trending-board harvester.

use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use trendwatch::config::{load_config_with_hash, Config};
use trendwatch::crawler::watch;
use trendwatch::output::{load_statistics, print_statistics};
use trendwatch::storage::SqliteStorage;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

/// Trendwatch: a trending-board harvester
///
/// Trendwatch periodically snapshots a ranked board of trending items,
/// fetches the detail page of every entry and records each crawl cycle in
/// a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "trendwatch")]
#[command(version = "1.0.0")]
#[command(about = "A trending-board harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print the settings without crawling
    #[arg(long, conflicts_with_all = ["stats", "cycles"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "cycles"])]
    stats: bool,

    /// Stop after this many cycles instead of running forever
    #[arg(long, value_name = "N")]
    cycles: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The log file comes from the config, so load it before logging is up
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    setup_logging(cli.verbose, cli.quiet, config.logging.file.as_deref())?;
    tracing::info!(
        hash = %config_hash,
        "Configuration loaded from {}",
        cli.config.display()
    );

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_watch(&config, cli.cycles).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber, teeing into `log_file` when given
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trendwatch=info,warn"),
            1 => EnvFilter::new("trendwatch=debug,info"),
            2 => EnvFilter::new("trendwatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            builder
                .with_ansi(false)
                .with_writer(BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file))))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

/// Handles the --dry-run mode: prints the validated settings
fn handle_dry_run(config: &Config) {
    println!("=== Trendwatch Dry Run ===\n");

    println!("Intervals:");
    println!(
        "  Between items: {}ms",
        config.intervals.interval_between_item
    );
    println!(
        "  Between cycles: {}ms",
        config.intervals.interval_between_cycle
    );

    println!("\nSource:");
    println!("  Board: {}", config.source.board_url);
    println!("  Item prefix: {}", config.source.question_url_prefix);
    println!("  User agent: {}", config.source.user_agent);
    println!(
        "  Cookie: {}",
        if config.source.cookie.is_some() {
            "set"
        } else {
            "none"
        }
    );
    println!("  Timeout: {}s", config.source.timeout_secs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    if let Some(top) = config.crawler.top {
        println!("\nCrawler:");
        println!("  Top entries per cycle: {}", top);
    }

    if let Some(file) = &config.logging.file {
        println!("\nLogging:");
        println!("  File: {}", file);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = SqliteStorage::open_existing(Path::new(&config.storage.database_path))
        .context("Failed to open database")?;

    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl loop
async fn handle_watch(config: &Config, cycles: Option<u32>) -> anyhow::Result<()> {
    match cycles {
        Some(n) => tracing::info!("Starting crawler for {} cycle(s)", n),
        None => tracing::info!("Starting crawler"),
    }

    watch(config, cycles).await.map_err(|e| {
        tracing::error!("Crawler stopped: {}", e);
        anyhow::Error::from(e)
    })
}
