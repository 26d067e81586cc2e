use serde::Deserialize;
use std::path::PathBuf;

/// Default User-Agent, a desktop Chrome string so viewers serve full pages
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";

/// Main configuration structure for PDF-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub http: HttpConfig,
    pub render: RenderConfig,
    pub cloud: CloudConfig,
    pub output: OutputConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Maximum number of recursive hops from a seed link
    pub max_depth: u32,

    /// Fixed delay inserted after every fetch attempt (milliseconds)
    pub delay_ms: u64,

    /// Cap on PDF links scraped from a single web page
    pub max_links_per_page: Option<usize>,

    /// Reuse files already present in the output directory
    pub skip_existing: bool,

    /// Largest HTML body kept in memory for link scraping (bytes)
    pub max_html_bytes: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            delay_ms: 500,
            max_links_per_page: None,
            skip_existing: true,
            max_html_bytes: 5 * 1024 * 1024,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Maximum redirect hops followed per request
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

/// Navigation milestone the renderer waits for before printing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

/// Paper size used when printing a page to PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PaperFormat {
    Letter,
    A4,
}

impl PaperFormat {
    /// Paper dimensions in inches (width, height)
    pub fn dimensions_inches(&self) -> (f64, f64) {
        match self {
            Self::Letter => (8.5, 11.0),
            Self::A4 => (8.27, 11.69),
        }
    }
}

/// Headless browser rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Render generic web pages to PDF
    pub enabled: bool,

    /// Per-step browser timeout (milliseconds)
    pub timeout_ms: u64,

    pub wait_until: WaitUntil,

    /// CSS selector that must be visible before printing
    pub wait_selector: Option<String>,

    /// Text that must be visible before printing
    pub wait_text: Option<String>,

    /// Final settle time before printing (milliseconds)
    pub extra_wait_ms: u64,

    /// Scroll the page to trigger lazy-loaded content
    pub auto_scroll: bool,

    pub max_scrolls: u32,

    /// Save a full-page screenshot as PDF when printing fails
    pub screenshot_fallback: bool,

    pub paper_format: PaperFormat,

    /// Explicit browser binary; discovered from PATH when unset
    pub chrome_path: Option<PathBuf>,

    pub viewport_width: u32,

    pub viewport_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 45_000,
            wait_until: WaitUntil::NetworkIdle,
            wait_selector: None,
            wait_text: None,
            extra_wait_ms: 1500,
            auto_scroll: true,
            max_scrolls: 10,
            screenshot_fallback: true,
            paper_format: PaperFormat::Letter,
            chrome_path: None,
            viewport_width: 1366,
            viewport_height: 2400,
        }
    }
}

/// Cloud document host configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CloudConfig {
    /// Host patterns served by the Drive file viewer
    pub drive_hosts: Vec<String>,

    /// Host patterns served by the Docs/Sheets/Slides editors
    pub docs_hosts: Vec<String>,

    /// Fall back to clicking the viewer's Download control in a browser
    pub browser_download: bool,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            drive_hosts: vec!["*.drive.google.com".to_string()],
            docs_hosts: vec!["*.docs.google.com".to_string()],
            browser_download: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory for downloaded and rendered PDFs
    pub directory: PathBuf,

    /// Create one subdirectory per seed PDF
    pub group_by_input: bool,

    /// Path of the optional markdown crawl report
    pub report_path: Option<PathBuf>,

    /// Print per-seed progress lines to stdout
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("downloads"),
            group_by_input: false,
            report_path: None,
            progress: true,
        }
    }
}
