//! Download-button automation for cloud viewers
//!
//! The viewer page is loaded in a real browser, each candidate Download
//! control is tried in turn, and the browser's own download events tell us
//! when and where the file landed.

use super::render::navigate;
use super::scripts;
use super::BrowserOptions;
use crate::crawler::{ensure_pdf_extension, sanitize_filename};
use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Time allowed for each candidate control to appear
const SELECTOR_WAIT: Duration = Duration::from_secs(5);

/// Time allowed between a click and the browser announcing a download
const DOWNLOAD_START_WAIT: Duration = Duration::from_secs(30);

/// Time allowed for an announced download to finish
const DOWNLOAD_FINISH_WAIT: Duration = Duration::from_secs(300);

pub(super) async fn download_via_ui(
    browser: &Browser,
    options: &BrowserOptions,
    url: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let absolute_dir = std::fs::canonicalize(out_dir)
        .with_context(|| format!("resolving {}", out_dir.display()))?;

    let behavior = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::AllowAndName)
        .download_path(absolute_dir.to_string_lossy().into_owned())
        .events_enabled(true)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid download behavior: {}", e))?;
    browser.execute(behavior).await?;

    let mut begins = browser.event_listener::<EventDownloadWillBegin>().await?;
    let mut progress = browser.event_listener::<EventDownloadProgress>().await?;

    let page = browser.new_page("about:blank").await?;
    let result = download_inner(
        &page,
        options,
        url,
        &absolute_dir,
        &mut begins,
        &mut progress,
    )
    .await;
    let _ = page.close().await;

    if let Err(e) = &result {
        warn!("Browser download failed for {}: {}", url, e);
    }
    result
}

async fn download_inner(
    page: &Page,
    options: &BrowserOptions,
    url: &str,
    dir: &Path,
    begins: &mut EventStream<EventDownloadWillBegin>,
    progress: &mut EventStream<EventDownloadProgress>,
) -> Result<PathBuf> {
    page.execute(SetUserAgentOverrideParams::new(options.user_agent.clone()))
        .await?;
    navigate(page, url, Duration::from_millis(options.render.timeout_ms)).await?;

    for selector in scripts::DOWNLOAD_SELECTORS {
        if !click_when_present(page, selector).await {
            continue;
        }
        debug!("Clicked {} on {}", selector, url);

        let started = match tokio::time::timeout(DOWNLOAD_START_WAIT, begins.next()).await {
            Ok(Some(event)) => event,
            _ => {
                debug!("No download started after clicking {}", selector);
                continue;
            }
        };

        return collect_download(
            wait_for_completion(progress, &started.guid),
            dir,
            &started.guid,
            &started.suggested_filename,
            options.skip_existing,
        )
        .await;
    }

    Err(anyhow::anyhow!(
        "Could not find a working Download control on {}",
        url
    ))
}

/// Waits for `selector` to appear and clicks it; false if it never appears
async fn click_when_present(page: &Page, selector: &str) -> bool {
    let deadline = Instant::now() + SELECTOR_WAIT;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return element.click().await.is_ok();
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

async fn wait_for_completion(
    progress: &mut EventStream<EventDownloadProgress>,
    guid: &str,
) -> Result<()> {
    let finished = tokio::time::timeout(DOWNLOAD_FINISH_WAIT, async {
        while let Some(event) = progress.next().await {
            if event.guid != guid {
                continue;
            }
            match event.state {
                DownloadProgressState::Completed => return Ok(()),
                DownloadProgressState::Canceled => {
                    return Err(anyhow::anyhow!("download {} was canceled", guid))
                }
                _ => {}
            }
        }
        Err(anyhow::anyhow!("browser closed before download {} finished", guid))
    })
    .await;

    finished.map_err(|_| anyhow::anyhow!("download {} did not finish in time", guid))?
}

/// Waits for an announced download, then moves it into place
///
/// The guid-named staging file is removed on every failure so no partial
/// download is left in the output directory.
async fn collect_download(
    completion: impl Future<Output = Result<()>>,
    dir: &Path,
    guid: &str,
    suggested: &str,
    skip_existing: bool,
) -> Result<PathBuf> {
    let staged = dir.join(guid);
    let result = match completion.await {
        Ok(()) => finalize(&staged, dir, suggested, skip_existing).await,
        Err(e) => Err(e),
    };
    if result.is_err() && tokio::fs::remove_file(&staged).await.is_ok() {
        debug!("Removed partial download {}", staged.display());
    }
    result
}

/// Moves the guid-named download to its sanitized `.pdf` name
async fn finalize(staged: &Path, dir: &Path, suggested: &str, skip_existing: bool) -> Result<PathBuf> {
    let suggested = if suggested.trim().is_empty() {
        "download.pdf"
    } else {
        suggested
    };
    let target = dir.join(ensure_pdf_extension(&sanitize_filename(suggested)));

    if skip_existing && target.exists() {
        info!("Exists, skipping: {}", target.display());
        let _ = tokio::fs::remove_file(staged).await;
        return Ok(target);
    }

    tokio::fs::rename(staged, &target)
        .await
        .with_context(|| format!("moving download to {}", target.display()))?;
    info!("Downloaded via browser: {}", target.display());
    Ok(target)
}
