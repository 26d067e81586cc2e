//! Harvest coordinator - recursive link-following orchestration
//!
//! This module ties the strategies together for every admitted URL:
//! 1. Direct fetch; a PDF is saved and its own links are followed
//! 2. Cloud viewer hosts go through the rewrite/confirm/browser chain
//! 3. Anything else is a web page: its PDF links are downloaded as leaves,
//!    the page is optionally rendered, and its links are followed
//!
//! Traversal is depth-first and strictly sequential. One `CrawlSession` is
//! threaded by `&mut` through the whole descent of a seed, so recursion is
//! expressed with boxed futures.

use super::cloud::resolve_cloud_doc;
use super::fetcher::{build_http_client, Fetched, Fetcher, PageBody};
use super::filename::sanitize_filename;
use super::inputs::gather_pdfs;
use super::parser::{parse_html, ParsedPage};
use super::session::CrawlSession;
use crate::browser::{default_backend, BrowserBackend, BrowserOptions, Provenance, RenderedPage};
use crate::config::{validate, Config};
use crate::output::{RunSummary, SeedReport};
use crate::pdf::links_from_file;
use crate::state::LinkState;
use crate::url::{classify_url, cloud_host};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Main harvester structure
///
/// Holds everything that outlives a single seed: configuration, the HTTP
/// fetcher and the browser backend. Per-seed state lives in
/// [`CrawlSession`].
pub struct Harvester {
    config: Arc<Config>,
    fetcher: Fetcher,
    browser: Arc<dyn BrowserBackend>,
}

impl Harvester {
    /// Creates a harvester with the browser backend compiled into this build
    pub fn new(config: Config) -> crate::Result<Self> {
        let browser = default_backend(BrowserOptions {
            render: config.render.clone(),
            user_agent: config.http.user_agent.clone(),
            skip_existing: config.crawl.skip_existing,
        });
        Self::with_browser(config, browser)
    }

    /// Creates a harvester with an explicit browser backend
    pub fn with_browser(config: Config, browser: Arc<dyn BrowserBackend>) -> crate::Result<Self> {
        let client = build_http_client(&config.http)?;
        let fetcher = Fetcher::new(client, &config.crawl);

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            browser,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes every seed in order, each with a fresh session
    pub async fn run(&self, seeds: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::new(
            self.config.output.directory.clone(),
            self.config.render.enabled,
        );

        for (index, seed) in seeds.iter().enumerate() {
            if index > 0 {
                self.pause().await;
            }
            self.progress(format!(
                "[{}/{}] Scanning PDF for links: {}",
                index + 1,
                seeds.len(),
                seed.display()
            ));

            let out_dir = self.seed_output_dir(seed);
            let report = self.harvest_seed(seed, &out_dir).await;
            if report.error.is_none() {
                self.progress(format!(
                    "Done: {} attempted, {} succeeded, {} rendered -> {}",
                    report.counts.attempted,
                    report.counts.succeeded,
                    report.counts.rendered,
                    out_dir.display()
                ));
            }
            summary.seeds.push(report);
        }

        summary.finish();
        summary
    }

    /// Traverses everything reachable from one seed PDF
    ///
    /// A seed that cannot be opened yields a report with zero links and
    /// zero attempts; it never aborts the run.
    pub async fn harvest_seed(&self, seed: &Path, out_dir: &Path) -> SeedReport {
        let candidates = match links_from_file(seed) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Skipping unreadable seed {}: {}", seed.display(), e);
                return SeedReport::unreadable(
                    seed.to_path_buf(),
                    out_dir.to_path_buf(),
                    e.to_string(),
                );
            }
        };

        let mut session = CrawlSession::new();
        session.counts.links_found = candidates.len();
        self.progress(format!("Found {} unique link(s)", candidates.len()));

        for candidate in candidates {
            tracing::debug!("Seed link ({:?}): {}", candidate.method, candidate.url);
            self.process_link(&mut session, candidate.url, out_dir, 0)
                .await;
        }

        SeedReport {
            seed: seed.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            counts: session.counts,
            outcomes: session.outcomes,
            renders: session.renders,
            error: None,
        }
    }

    /// Resolves one URL and recurses into whatever it yields
    ///
    /// Already-visited URLs and URLs deeper than `max-depth` are no-ops.
    /// Every failure is logged and recorded; none is returned.
    pub fn process_link<'a>(
        &'a self,
        session: &'a mut CrawlSession,
        url: String,
        out_dir: &'a Path,
        depth: u32,
    ) -> BoxFuture<'a, ()> {
        async move {
            if !session.admit(&url, depth, self.config.crawl.max_depth) {
                return;
            }

            let parsed = match Url::parse(&url) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::debug!("Unparseable link {}: {}", url, e);
                    session.record(&url, depth, LinkState::Failed, None);
                    return;
                }
            };
            tracing::debug!(
                "[depth {}] {} ({:?})",
                depth,
                url,
                classify_url(&url, &self.config.cloud)
            );

            // 1. Direct fetch
            let body = match self.fetcher.fetch(&url, out_dir).await {
                Ok(Fetched::Pdf(pdf)) => {
                    session.record(&url, depth, LinkState::PdfDownloaded, Some(pdf.path.clone()));
                    self.pause().await;
                    self.follow_pdf(session, &pdf.path, out_dir, depth).await;
                    return;
                }
                Ok(Fetched::NotPdf(body)) => Some(body),
                Err(e) => {
                    tracing::debug!("Direct fetch failed for {}: {}", url, e);
                    None
                }
            };
            self.pause().await;

            // 2. Cloud viewer
            if let Some(host) = cloud_host(&parsed, &self.config.cloud) {
                let browser = self
                    .config
                    .cloud
                    .browser_download
                    .then(|| self.browser.as_ref());

                match resolve_cloud_doc(&self.fetcher, browser, &parsed, host, out_dir).await {
                    Ok(pdf) => {
                        tracing::info!("Resolved cloud document {} -> {}", url, pdf.path.display());
                        session.record(&url, depth, LinkState::CloudDocResolved, Some(pdf.path.clone()));
                        self.pause().await;
                        self.follow_pdf(session, &pdf.path, out_dir, depth).await;
                    }
                    Err(e) => {
                        tracing::warn!("Could not resolve cloud document {}: {}", url, e);
                        session.record(&url, depth, LinkState::Failed, None);
                        self.pause().await;
                    }
                }
                return;
            }

            // 3. Generic page
            let children = self
                .process_page(session, &url, &parsed, body, out_dir, depth)
                .await;
            if depth < self.config.crawl.max_depth {
                self.follow_links(session, children, out_dir, depth).await;
            }
        }
        .boxed()
    }

    /// Scrapes and renders a web page, returning the links to follow
    async fn process_page(
        &self,
        session: &mut CrawlSession,
        url: &str,
        parsed: &Url,
        body: Option<PageBody>,
        out_dir: &Path,
        depth: u32,
    ) -> Vec<String> {
        let scraped = match &body {
            Some(body) => {
                let base = Url::parse(&body.final_url).unwrap_or_else(|_| parsed.clone());
                parse_html(&body.html, &base)
            }
            None => ParsedPage::default(),
        };

        let mut leaves = scraped.pdf_links.clone();
        if let Some(max) = self.config.crawl.max_links_per_page {
            leaves.truncate(max);
        }
        if !leaves.is_empty() {
            tracing::info!("Found {} PDF links on {}", leaves.len(), url);
        }
        for leaf in leaves {
            self.fetch_leaf(session, &leaf, out_dir, depth + 1).await;
        }

        let rendered = if self.config.render.enabled {
            self.render(session, url, out_dir).await
        } else {
            None
        };

        let state = if body.is_some() || rendered.is_some() {
            LinkState::GenericPageProcessed
        } else {
            LinkState::Failed
        };
        session.record(url, depth, state, rendered.as_ref().map(|r| r.path.clone()));

        match rendered {
            Some(page) if page.provenance != Provenance::Screenshot => {
                match links_from_file(&page.path) {
                    Ok(candidates) => candidates.into_iter().map(|c| c.url).collect(),
                    Err(e) => {
                        tracing::debug!("Could not read links from {}: {}", page.path.display(), e);
                        scraped.links
                    }
                }
            }
            _ => scraped.links,
        }
    }

    /// Downloads a PDF linked from a page without following its links
    async fn fetch_leaf(&self, session: &mut CrawlSession, url: &str, out_dir: &Path, depth: u32) {
        if !session.admit_leaf(url) {
            return;
        }

        match self.fetcher.fetch_pdf(url, out_dir).await {
            Ok(pdf) => session.record(url, depth, LinkState::PdfDownloaded, Some(pdf.path)),
            Err(e) => {
                tracing::debug!("PDF link failed {}: {}", url, e);
                session.record(url, depth, LinkState::Failed, None);
            }
        }
        self.pause().await;
    }

    async fn render(&self, session: &mut CrawlSession, url: &str, out_dir: &Path) -> Option<RenderedPage> {
        match self.browser.render_page(url, out_dir).await {
            Ok(page) => {
                tracing::info!("Rendered {} -> {} ({})", url, page.path.display(), page.provenance);
                session.record_render(page.clone());
                Some(page)
            }
            Err(e) => {
                tracing::warn!("Could not render {}: {}", url, e);
                None
            }
        }
    }

    /// Follows the links inside a PDF obtained at `depth`
    async fn follow_pdf(&self, session: &mut CrawlSession, pdf: &Path, out_dir: &Path, depth: u32) {
        if depth >= self.config.crawl.max_depth {
            return;
        }

        let children = match links_from_file(pdf) {
            Ok(candidates) => candidates.into_iter().map(|c| c.url).collect(),
            Err(e) => {
                tracing::debug!("Could not extract links from {}: {}", pdf.display(), e);
                return;
            }
        };
        self.follow_links(session, children, out_dir, depth).await;
    }

    async fn follow_links(&self, session: &mut CrawlSession, children: Vec<String>, out_dir: &Path, depth: u32) {
        for child in children {
            if session.is_visited(&child) {
                continue;
            }
            self.process_link(session, child, out_dir, depth + 1).await;
            self.pause().await;
        }
    }

    /// Where a seed's artifacts go
    fn seed_output_dir(&self, seed: &Path) -> PathBuf {
        let root = &self.config.output.directory;
        if !self.config.output.group_by_input {
            return root.clone();
        }
        match seed.file_stem() {
            Some(stem) => root.join(sanitize_filename(&stem.to_string_lossy())),
            None => root.clone(),
        }
    }

    /// Reports seed-level progress on stdout, or to the log when disabled
    fn progress(&self, line: String) {
        if self.config.output.progress {
            println!("{}", line);
        } else {
            tracing::info!("{}", line);
        }
    }

    async fn pause(&self) {
        if self.config.crawl.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.crawl.delay_ms)).await;
        }
    }
}

/// Gathers the seed PDFs under `input` and harvests each of them
///
/// # Errors
///
/// Only setup problems are fatal: an invalid configuration, a missing path,
/// no PDFs to process, or an HTTP client that cannot be built.
pub async fn harvest(config: Config, input: &Path, recursive: bool) -> crate::Result<RunSummary> {
    validate(&config)?;
    let seeds = gather_pdfs(input, recursive)?;
    tracing::info!("Found {} seed PDF(s) under {}", seeds.len(), input.display());

    let harvester = Harvester::new(config)?;
    Ok(harvester.run(&seeds).await)
}
