//! Galleria main entry point
//!
//! This is the command-line interface for the Galleria gallery harvester.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use galleria::browser::{build_http_client, HttpBrowser};
use galleria::config::{load_config_with_hash, validate, Config};
use galleria::output::{print_statistics, write_report, BatchReport};
use galleria::retrieve::HttpTransfer;
use galleria::url::extract_target_id;
use galleria::CrawlOrchestrator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Galleria: a product gallery image harvester
///
/// Galleria loads product pages, captures every image URL the page reveals,
/// upgrades them to their high-resolution form, and saves them to disk.
#[derive(Parser, Debug)]
#[command(name = "galleria")]
#[command(version)]
#[command(about = "A product gallery image harvester", long_about = None)]
struct Cli {
    /// Product page addresses (prompted for when omitted)
    #[arg(value_name = "ADDRESS")]
    addresses: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the download root directory
    #[arg(short = 'o', long, value_name = "DIR")]
    download_root: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match load(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e.into());
        }
    };

    if let Some(root) = cli.download_root {
        config.retrieval.download_root = root;
        validate(&config)?;
    }

    let addresses = if cli.addresses.is_empty() {
        vec![prompt_for_address().await?]
    } else {
        cli.addresses
    };

    if cli.dry_run {
        handle_dry_run(&config, &addresses);
        return Ok(());
    }

    handle_batch(config, &config_hash, &addresses).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("galleria=info,warn"),
            1 => EnvFilter::new("galleria=debug,info"),
            2 => EnvFilter::new("galleria=trace,debug"),
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

/// Loads the config file, or validated defaults when none is given
fn load(path: &Option<PathBuf>) -> anyhow::Result<(Config, String)> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("reading {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((config, hash))
        }
        None => {
            let config = Config::default();
            validate(&config).context("built-in defaults")?;
            tracing::info!("No configuration file given, using defaults");
            Ok((config, "default".to_string()))
        }
    }
}

/// Asks for a single address on stdin
async fn prompt_for_address() -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Product page address: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading address from stdin")?;

    let address = line.trim().to_string();
    if address.is_empty() {
        bail!("no address entered");
    }
    Ok(address)
}

/// Handles the --dry-run mode: shows the effective config and targets
fn handle_dry_run(config: &Config, addresses: &[String]) {
    println!("=== Galleria Dry Run ===\n");

    println!("Browser:");
    println!("  Navigation timeout: {}ms", config.browser.timeout_ms);
    println!("  User agent: {}", config.browser.user_agent);
    if let Some(proxy) = &config.proxy {
        println!("  Proxy: {}", proxy.server);
    }

    println!("\nCrawl:");
    println!("  Attempts per target: {}", config.crawl.retry_attempts);
    println!("  Retry base delay: {}ms", config.crawl.retry_base_delay_ms);
    println!("  Settle delay: {}ms", config.crawl.settle_delay_ms);
    println!("  Max scroll rounds: {}", config.crawl.max_scroll_rounds);

    println!("\nRetrieval:");
    println!("  Download root: {}", config.retrieval.download_root);
    println!(
        "  Pacing: {}-{}ms",
        config.retrieval.min_pacing_ms, config.retrieval.max_pacing_ms
    );
    println!("  Max bytes per image: {}", config.retrieval.max_bytes);

    println!("\nSite:");
    println!("  CDN domain: {}", config.site.cdn_domain);
    println!("  Upgrade marker: {}", config.site.upgrade_marker);

    println!("\nTargets ({}):", addresses.len());
    for address in addresses {
        println!("  - {} (id: {})", address, extract_target_id(address));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main batch run and writes the report
async fn handle_batch(
    config: Config,
    config_hash: &str,
    addresses: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_http_client(&config)?;
    let browser = Arc::new(HttpBrowser::new(
        client.clone(),
        config.retrieval.max_redirects,
    ));
    let transfer = Arc::new(HttpTransfer::new(client));
    let orchestrator = CrawlOrchestrator::new(&config, browser, transfer)?;

    tracing::info!("Starting batch of {} targets", addresses.len());
    let started_at = Utc::now();
    let outcomes = orchestrator.run_batch(addresses).await;

    let report = BatchReport::new(
        started_at,
        config_hash,
        &config.retrieval.download_root,
        outcomes,
    );

    match write_report(&report, Path::new(&config.retrieval.download_root)) {
        Ok((json_path, _)) => tracing::info!("Batch report saved to {}", json_path.display()),
        Err(e) => {
            tracing::error!("Failed to write batch report: {}", e);
            return Err(e.into());
        }
    }

    print_statistics(&report);
    Ok(())
}
