//! PDF-Harvest main entry point
//!
//! This is the command-line interface for the PDF-Harvest link harvester.

use anyhow::Context;
use clap::Parser;
use pdf_harvest::config::{load_config_with_hash, validate, Config, PaperFormat, WaitUntil};
use pdf_harvest::crawler::harvest;
use pdf_harvest::output::{generate_markdown_report, print_summary};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// PDF-Harvest: follow the links inside PDFs and keep what they point to
///
/// Every link found in the input PDFs is downloaded if it is a PDF,
/// exported if it is a cloud document, or scraped and rendered to PDF if it
/// is a web page. PDFs obtained this way are searched for links in turn.
#[derive(Parser, Debug)]
#[command(name = "pdf-harvest")]
#[command(version)]
#[command(about = "Recursively harvest the documents linked from PDFs", long_about = None)]
struct Cli {
    /// A seed PDF or a directory of seed PDFs
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Write each seed's files to a subfolder named after it
    #[arg(long)]
    group_by_input: bool,

    /// Scan input directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Seconds to wait after every request
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    #[arg(long)]
    user_agent: Option<String>,

    /// Maximum PDF links downloaded from one web page
    #[arg(long, value_name = "N")]
    max_from_page: Option<usize>,

    /// Maximum recursion depth
    #[arg(long)]
    depth: Option<u32>,

    /// Render web pages to PDF
    #[arg(long, overrides_with = "no_render_pages")]
    render_pages: bool,

    #[arg(long, overrides_with = "render_pages")]
    no_render_pages: bool,

    /// CSS selector to wait for before rendering
    #[arg(long)]
    wait_selector: Option<String>,

    /// Visible text to wait for before rendering
    #[arg(long)]
    wait_text: Option<String>,

    /// Extra settle time before printing (milliseconds)
    #[arg(long)]
    extra_wait_ms: Option<u64>,

    #[arg(long, overrides_with = "no_auto_scroll")]
    auto_scroll: bool,

    #[arg(long, overrides_with = "auto_scroll")]
    no_auto_scroll: bool,

    #[arg(long)]
    max_scrolls: Option<u32>,

    /// Save a screenshot as PDF when printing fails
    #[arg(long, overrides_with = "no_screenshot_fallback")]
    screenshot_fallback: bool,

    #[arg(long, overrides_with = "screenshot_fallback")]
    no_screenshot_fallback: bool,

    #[arg(long, value_enum)]
    pdf_format: Option<PaperFormat>,

    #[arg(long)]
    render_timeout_ms: Option<u64>,

    #[arg(long, value_enum)]
    wait_until: Option<WaitUntil>,

    /// Keep files that already exist instead of fetching them again
    #[arg(long, overrides_with = "no_skip_existing")]
    skip_existing: bool,

    #[arg(long, overrides_with = "skip_existing")]
    no_skip_existing: bool,

    /// Write a markdown report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress and non-error log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli)?;
    validate(&config).context("invalid configuration")?;

    tracing::info!(
        "Harvesting {} into {} (depth {}, rendering {})",
        cli.input.display(),
        config.output.directory.display(),
        config.crawl.max_depth,
        if config.render.enabled { "on" } else { "off" }
    );

    let report_path = config.output.report_path.clone();
    let summary = harvest(config, &cli.input, cli.recursive).await?;

    print_summary(&summary);

    if let Some(path) = report_path {
        generate_markdown_report(&summary, &path)
            .with_context(|| format!("writing report {}", path.display()))?;
        println!("Report written to: {}", path.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pdf_harvest=warn"),
            1 => EnvFilter::new("pdf_harvest=info,warn"),
            2 => EnvFilter::new("pdf_harvest=debug,info"),
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

/// Resolves an `--x` / `--no-x` pair; `None` keeps the configured value
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Applies command-line values on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(out) = &cli.out {
        config.output.directory = out.clone();
    }
    if cli.group_by_input {
        config.output.group_by_input = true;
    }
    if let Some(report) = &cli.report {
        config.output.report_path = Some(report.clone());
    }
    if cli.quiet {
        config.output.progress = false;
    }

    if let Some(delay) = cli.delay {
        if !delay.is_finite() || delay < 0.0 {
            anyhow::bail!("--delay must be a non-negative number of seconds, got {}", delay);
        }
        config.crawl.delay_ms = (delay * 1000.0).round() as u64;
    }
    if let Some(max) = cli.max_from_page {
        config.crawl.max_links_per_page = Some(max);
    }
    if let Some(depth) = cli.depth {
        config.crawl.max_depth = depth;
    }
    if let Some(skip) = toggle(cli.skip_existing, cli.no_skip_existing) {
        config.crawl.skip_existing = skip;
    }

    if let Some(agent) = &cli.user_agent {
        config.http.user_agent = agent.clone();
    }

    let render = &mut config.render;
    if let Some(enabled) = toggle(cli.render_pages, cli.no_render_pages) {
        render.enabled = enabled;
    }
    if let Some(selector) = &cli.wait_selector {
        render.wait_selector = Some(selector.clone());
    }
    if let Some(text) = &cli.wait_text {
        render.wait_text = Some(text.clone());
    }
    if let Some(ms) = cli.extra_wait_ms {
        render.extra_wait_ms = ms;
    }
    if let Some(scroll) = toggle(cli.auto_scroll, cli.no_auto_scroll) {
        render.auto_scroll = scroll;
    }
    if let Some(max) = cli.max_scrolls {
        render.max_scrolls = max;
    }
    if let Some(fallback) = toggle(cli.screenshot_fallback, cli.no_screenshot_fallback) {
        render.screenshot_fallback = fallback;
    }
    if let Some(format) = cli.pdf_format {
        render.paper_format = format;
    }
    if let Some(ms) = cli.render_timeout_ms {
        render.timeout_ms = ms;
    }
    if let Some(wait_until) = cli.wait_until {
        render.wait_until = wait_until;
    }

    Ok(())
}
