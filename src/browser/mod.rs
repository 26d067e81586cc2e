//! Headless browser strategies
//!
//! Two operations need a real browser: printing a generic web page to PDF,
//! and clicking the "Download" control of a cloud viewer when no export URL
//! works. Both sit behind [`BrowserBackend`] so the crawler can run with a
//! Chrome instance, a test double, or no browser at all.
//!
//! Browser code reports failures as `anyhow::Error`; the crawler logs them
//! and moves on to its next strategy.

#[cfg(feature = "browser")]
mod chrome;
#[cfg(feature = "browser")]
mod download;
#[cfg(feature = "browser")]
mod render;
#[cfg(feature = "browser")]
mod scripts;

#[cfg(feature = "browser")]
pub use chrome::{find_chrome, ChromeBackend};

use crate::config::RenderConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a rendered page artifact was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// The browser's print-to-PDF output
    Printed,
    /// A full-page screenshot wrapped in a PDF
    Screenshot,
    /// A file from an earlier run was kept; how it was made is unknown
    Existing,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Printed => "printed",
            Self::Screenshot => "screenshot",
            Self::Existing => "existing",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A web page snapshot written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub path: PathBuf,
    pub provenance: Provenance,
}

/// Browser operations the crawler can fall back to
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    /// Loads `url`, waits for it to settle, and saves it as a PDF in `out_dir`
    async fn render_page(&self, url: &str, out_dir: &Path) -> Result<RenderedPage>;

    /// Opens a cloud viewer at `url`, clicks its Download control, and saves
    /// the resulting file in `out_dir`
    async fn click_download(&self, url: &str, out_dir: &Path) -> Result<PathBuf>;
}

/// Backend used when browser support is compiled out
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

#[async_trait]
impl BrowserBackend for NoBrowser {
    async fn render_page(&self, url: &str, _out_dir: &Path) -> Result<RenderedPage> {
        Err(anyhow::anyhow!(
            "cannot render {}: browser support not compiled. Rebuild with: cargo build --features browser",
            url
        ))
    }

    async fn click_download(&self, url: &str, _out_dir: &Path) -> Result<PathBuf> {
        Err(anyhow::anyhow!(
            "cannot download {} through a browser: browser support not compiled",
            url
        ))
    }
}

/// Options a browser backend needs beyond the render section
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub render: RenderConfig,
    pub user_agent: String,
    pub skip_existing: bool,
}

/// Picks the backend for this build
#[cfg(feature = "browser")]
pub fn default_backend(options: BrowserOptions) -> Arc<dyn BrowserBackend> {
    Arc::new(ChromeBackend::new(options))
}

/// Picks the backend for this build
#[cfg(not(feature = "browser"))]
pub fn default_backend(_options: BrowserOptions) -> Arc<dyn BrowserBackend> {
    Arc::new(NoBrowser)
}
