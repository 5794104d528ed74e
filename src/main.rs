//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest category crawler.

use anyhow::{bail, Context};
use catalog_harvest::browser::open_session;
use catalog_harvest::config::{apply_overrides, load_config_with_hash, Config};
use catalog_harvest::crawler::{scrape_products, CrawlRequest};
use catalog_harvest::extract::ProductExtractor;
use catalog_harvest::output::{generate_markdown_report, print_report, Exporter};
use catalog_harvest::CrawlService;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Seconds between two progress lines while a crawl runs
const POLL_INTERVAL_SECS: u64 = 5;

/// Catalog-Harvest: a resilient product catalog crawler
///
/// Walks every page of an e-commerce category listing, extracts each linked
/// product, and checkpoints the records to CSV as it goes.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient product catalog crawler", long_about = None)]
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

    /// Crawl this category instead of the configured one
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Stop after this many listing pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["records", "products"])]
    dry_run: bool,

    /// Print one page of the exported records and exit
    #[arg(long, value_name = "PAGE", conflicts_with_all = ["dry_run", "products"])]
    records: Option<usize>,

    /// Scrape only these product pages, with retries
    #[arg(long, value_name = "URL", num_args = 1.., conflicts_with_all = ["dry_run", "records"])]
    products: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let config = apply_overrides(config, cli.url.clone(), cli.max_pages)
        .context("Invalid command-line override")?;

    let _guard = setup_logging(cli.verbose, cli.quiet, config.logging.file.as_deref())?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(page) = cli.records {
        handle_records(config, page)?;
    } else if !cli.products.is_empty() {
        handle_products(&config, &cli.products).await?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up console logging, plus a file layer when one is configured
///
/// The returned guard flushes the file writer on drop and must live until
/// the end of `main`.
fn setup_logging(verbose: u8, quiet: bool, file: Option<&str>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, guard) = match file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file has no file name: {}", file))?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Crawl:");
    println!("  Category: {}", config.crawl.category_url);
    println!("  Label: {}", config.crawl.category_label);
    match config.crawl.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }
    println!("  Fallback page count: {}", config.crawl.fallback_total_pages);
    println!("  Checkpoint every: {} products", config.crawl.checkpoint_every);
    println!(
        "  Pause between pages: {}-{}ms",
        config.crawl.pause_min_ms, config.crawl.pause_max_ms
    );
    println!("  Page parameters: {}", config.crawl.page_params.join(", "));

    println!("\nBrowser:");
    println!("  Backend: {:?}", config.browser.backend);
    println!("  User agent: {}", config.browser.user_agent);
    println!("  Wait timeout: {}s", config.browser.wait_timeout_secs);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    println!("  Backup: {}", config.output.backup);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Delay: {}ms base, x{} per attempt, {}ms cap",
        config.retry.base_delay_ms, config.retry.backoff_multiplier, config.retry.max_delay_ms
    );

    println!("\nConfiguration is valid.");
}

/// Handles the --records mode: prints one page of the persisted records
fn handle_records(config: Config, page: usize) -> anyhow::Result<()> {
    let service = CrawlService::new(config);
    let records = service
        .records(page)
        .context("Failed to read exported records")?;

    println!(
        "Page {} of {} ({} records)\n",
        records.page, records.total_pages, records.total_records
    );
    if records.rows.is_empty() {
        println!("No records.");
        return Ok(());
    }

    println!("{}", records.columns.join(" | "));
    for row in &records.rows {
        let cells: Vec<&str> = records
            .columns
            .iter()
            .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
            .collect();
        println!("{}", cells.join(" | "));
    }
    Ok(())
}

/// Handles the --products mode: scrapes an explicit list of product pages
async fn handle_products(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    tracing::info!("Scraping {} product pages", urls.len());

    let mut session = open_session(&config.browser)
        .await
        .context("Failed to open browser session")?;
    let extractor = ProductExtractor::from_config(config);
    let records = scrape_products(session.as_mut(), urls, &extractor, &config.retry).await;

    let path = Exporter::from_config(&config.output)
        .export(&records)
        .context("Failed to export records")?;
    println!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Runs a full category crawl in the background and reports progress
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let summary_path = config.output.summary_path.clone();
    let request = CrawlRequest::from_config(&config);
    let service = CrawlService::new(config).with_config_hash(config_hash);

    let mut handle = service.start(request)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
    ticker.tick().await;

    let report = loop {
        tokio::select! {
            joined = &mut handle => break joined.context("Crawl task panicked")?,
            _ = ticker.tick() => {
                let (status, eta) = service.status();
                tracing::info!(
                    "Progress: {}/{} products ({}), last: {}, remaining: {}",
                    status.processed_count,
                    status.total_products_estimate,
                    status.phase,
                    status.last_product_name,
                    eta
                );
            }
        }
    };

    print_report(&report);

    if let Some(path) = summary_path {
        let path = PathBuf::from(path);
        generate_markdown_report(&report, &path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }

    if let Some(error) = &report.error {
        bail!("Crawl aborted: {}", error);
    }
    Ok(())
}
