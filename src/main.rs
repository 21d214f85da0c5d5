//! Community-Harvest main entry point
//!
//! Command-line interface: searches community sites for keywords, crawls the
//! relevant posts and prints them as JSON lines on stdout.

use anyhow::{bail, Context};
use clap::Parser;
use community_harvest::config::{load_config_with_hash, Config};
use community_harvest::crawler::CrawlOrchestrator;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Community-Harvest: polite collection of community posts and comments
///
/// Discovers posts about the given keywords on community sites through
/// interchangeable search backends, keeps the relevant ones, and crawls
/// each post with its comment thread under per-domain rate limits.
#[derive(Parser, Debug)]
#[command(name = "community-harvest")]
#[command(version)]
#[command(about = "Polite collection of community posts and comments", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Keyword to search for (repeatable; replaces [targets] keywords)
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Site to search (repeatable; replaces [targets] sites)
    #[arg(short, long = "site", value_name = "SITE")]
    sites: Vec<String>,

    /// Crawl these post URLs directly instead of searching (repeatable)
    #[arg(long = "url", value_name = "URL", conflicts_with = "search_only")]
    urls: Vec<String>,

    /// Print discovered candidates without crawling them
    #[arg(long)]
    search_only: bool,

    /// Validate config and show what would be searched without any network access
    #[arg(long, conflicts_with_all = ["search_only", "urls"])]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if !cli.keywords.is_empty() {
        config.targets.keywords = cli.keywords.clone();
    }
    if !cli.sites.is_empty() {
        config.targets.sites = cli.sites.clone();
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let orchestrator =
        CrawlOrchestrator::from_config(&config).context("failed to build the crawl pipeline")?;

    if !cli.urls.is_empty() {
        let keyword = config.targets.keywords.first().cloned().unwrap_or_default();
        let report = orchestrator.crawl_urls(&cli.urls, &keyword).await;
        print_json_lines(&report.posts)?;
        tracing::info!(
            "Crawled {}/{} URLs",
            report.total_crawled,
            report.total_searched
        );
        return Ok(());
    }

    if config.targets.keywords.is_empty() || config.targets.sites.is_empty() {
        bail!("no keywords or sites: set [targets] in the config or pass -k/-s");
    }

    if cli.search_only {
        let (targets, events) = orchestrator
            .search_only(&config.targets.keywords, &config.targets.sites)
            .await;
        print_json_lines(&targets)?;
        tracing::info!(
            "{} candidates found, {} sites without results",
            targets.len(),
            events.len()
        );
        return Ok(());
    }

    let report = orchestrator
        .run(&config.targets.keywords, &config.targets.sites)
        .await;
    print_json_lines(&report.posts)?;

    for event in &report.events {
        tracing::debug!("Event: {}", event);
    }
    let comments: usize = report.posts.iter().map(|p| p.comment_count()).sum();
    tracing::info!(
        "{} posts with {} comments from {} candidates ({} failed, {} events)",
        report.total_crawled,
        comments,
        report.total_searched,
        report.total_failed,
        report.events.len()
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the JSON records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("community_harvest=info,warn"),
            1 => EnvFilter::new("community_harvest=debug,info"),
            2 => EnvFilter::new("community_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_json_lines<T: Serialize>(records: &[T]) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in records {
        serde_json::to_writer(&mut out, record).context("failed to serialize record")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Handles the --dry-run mode: shows what would be searched
fn handle_dry_run(config: &Config) {
    println!("=== Community-Harvest Dry Run ===\n");

    println!("Crawler:");
    println!("  Default delay: {}s", config.crawler.default_delay);
    println!(
        "  Jitter: {}s - {}s",
        config.crawler.jitter_min, config.crawler.jitter_max
    );
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Relevance threshold: {}", config.crawler.relevance_threshold);
    println!("  Max comment pages: {}", config.crawler.max_comment_pages);
    println!("  Cache TTL: {}s", config.crawler.cache_ttl);
    for (domain, delay) in &config.crawler.domain_delays {
        println!("  Delay override: {} = {}s", domain, delay);
    }

    println!("\nSearch adapters (failover order):");
    for name in &config.search.adapters {
        println!("  - {}", name);
    }
    println!("  Max results per site: {}", config.search.max_results_per_site);

    println!("\nKeywords ({}):", config.targets.keywords.len());
    for keyword in &config.targets.keywords {
        println!("  - {}", keyword);
    }

    println!("\nSites ({}):", config.targets.sites.len());
    for site in &config.targets.sites {
        println!("  - {}", site);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would run {} searches", config.targets.sites.len());
}
