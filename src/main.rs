//! Linkwell main entry point
//!
//! This is the command-line interface for the linkwell batch crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use linkwell::config::{load_config, Config};
use linkwell::crawler::{build_http_client, CrawlDispatcher, PageFetcher, RunState};
use linkwell::storage::{LinkStore, SqliteStore};
use linkwell::transfer::{export_hosts_to_path, import_files};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How often the crawl command reports progress
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(3);

/// Linkwell: a batch-cycling link crawler
///
/// Linkwell claims batches of uncrawled URLs from a SQLite store, fetches
/// them across a worker pool, and feeds every absolute link it finds back
/// into the store for later cycles.
#[derive(Parser, Debug)]
#[command(name = "linkwell")]
#[command(version)]
#[command(about = "A batch-cycling link crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the crawl loop until interrupted
    Crawl {
        /// Worker count for this run (defaults to the configured value)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Import newline-delimited URL list files as uncrawled links
    Import {
        /// Text files with one URL per line
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Export the deduplicated host list of every stored link
    Export {
        /// Output file path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Print store statistics and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    match cli.command {
        Command::Crawl { concurrency } => handle_crawl(config, concurrency).await,
        Command::Import { files } => handle_import(&config, &files),
        Command::Export { output } => handle_export(&config, &output),
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkwell=info,warn"),
            1 => EnvFilter::new("linkwell=debug,info"),
            2 => EnvFilter::new("linkwell=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    linkwell::storage::open_store(Path::new(&config.storage.database_path))
        .with_context(|| format!("failed to open database {}", config.storage.database_path))
}

/// Handles the crawl subcommand: runs the dispatch loop until interrupted
///
/// Progress is reported every few seconds from a dispatcher snapshot. On
/// Ctrl-C the dispatcher is asked to stop, the in-flight cycle finishes its
/// flush, and only then does the process exit.
async fn handle_crawl(config: Config, concurrency_override: Option<usize>) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let client = build_http_client(&config.crawler).context("failed to build HTTP client")?;
    let dispatcher =
        CrawlDispatcher::new(store, PageFetcher::new(client), config.crawler.batch_size);

    let concurrency = concurrency_override.unwrap_or(config.crawler.concurrency);
    dispatcher.start(concurrency)?;

    let mut ticker = tokio::time::interval(SNAPSHOT_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, stopping after the in-flight cycle");
                dispatcher.stop();
                break;
            }
            _ = ticker.tick() => {
                match dispatcher.snapshot() {
                    Ok(snapshot) => {
                        if snapshot.state == RunState::Idle {
                            // The loop ended on its own; the final snapshot
                            // below reports why
                            break;
                        }
                        tracing::info!(
                            "{} | pending: {} | discovered: {} | stored: {}",
                            snapshot.state,
                            snapshot.pending_discovered,
                            snapshot.total_discovered,
                            snapshot.stored_links
                        );
                    }
                    Err(e) => tracing::warn!("Snapshot failed: {}", e),
                }
            }
        }
    }

    dispatcher.wait_until_idle().await;

    let snapshot = dispatcher.snapshot().context("failed to read final state")?;
    if let Some(error) = snapshot.last_error {
        anyhow::bail!("crawl run terminated: {}", error);
    }

    tracing::info!(
        "Crawl stopped cleanly: {} links discovered this session, {} stored",
        snapshot.total_discovered,
        snapshot.stored_links
    );
    Ok(())
}

/// Handles the import subcommand
fn handle_import(config: &Config, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let imported = import_files(&mut store, files)?;

    println!(
        "Imported {} links into {}",
        imported, config.storage.database_path
    );
    Ok(())
}

/// Handles the export subcommand
fn handle_export(config: &Config, output: &Path) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let hosts = export_hosts_to_path(&store, output)?;

    println!("Exported {} unique hosts to {}", hosts, output.display());
    Ok(())
}

/// Handles the stats subcommand
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let total = store.count()?;
    let uncrawled = store.count_uncrawled()?;

    println!("Database: {}", config.storage.database_path);
    println!("  Total links: {}", total);
    println!("  Crawled:     {}", total - uncrawled);
    println!("  Uncrawled:   {}", uncrawled);
    Ok(())
}
