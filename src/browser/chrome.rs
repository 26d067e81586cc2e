//! Chrome discovery, launch and teardown
//!
//! A fresh browser process is started for every render or download and shut
//! down afterwards, so no state leaks from one page to the next.

use super::{BrowserBackend, BrowserOptions, RenderedPage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Common Chrome executable paths to check
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Executable names looked up on `PATH`
const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Finds a Chrome/Chromium executable
///
/// An explicitly configured path wins; then well-known install locations;
/// then `PATH`.
pub fn find_chrome(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        anyhow::ensure!(path.exists(), "configured chrome-path {} does not exist", path.display());
        return Ok(path.to_path_buf());
    }

    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            debug!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in CHROME_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            debug!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(anyhow::anyhow!(
        "Chrome/Chromium not found. Install it or set render.chrome-path"
    ))
}

/// A launched browser plus the task draining its CDP event stream
pub(super) struct ChromeSession {
    pub browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let chrome_path = find_chrome(options.render.chrome_path.as_deref())?;
        let render = &options.render;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(render.viewport_width, render.viewport_height)
            .viewport(Viewport {
                width: render.viewport_width,
                height: render.viewport_height,
                ..Default::default()
            })
            .request_timeout(Duration::from_millis(render.timeout_ms))
            .no_sandbox()
            .arg("--ignore-certificate-errors")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Closes the browser and waits for the process to exit
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

/// Browser backend driving a local headless Chrome
#[derive(Debug, Clone)]
pub struct ChromeBackend {
    options: BrowserOptions,
}

impl ChromeBackend {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl BrowserBackend for ChromeBackend {
    async fn render_page(&self, url: &str, out_dir: &Path) -> Result<RenderedPage> {
        info!("Rendering {}", url);
        let session = ChromeSession::launch(&self.options).await?;
        let result = super::render::render_to_pdf(&session.browser, &self.options, url, out_dir).await;
        session.shutdown().await;
        result
    }

    async fn click_download(&self, url: &str, out_dir: &Path) -> Result<PathBuf> {
        info!("Trying browser download for {}", url);
        let session = ChromeSession::launch(&self.options).await?;
        let result =
            super::download::download_via_ui(&session.browser, &self.options, url, out_dir).await;
        session.shutdown().await;
        result
    }
}
