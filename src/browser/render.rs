//! Page-to-PDF rendering

use super::scripts;
use super::{BrowserOptions, Provenance, RenderedPage};
use crate::config::WaitUntil;
use crate::crawler::page_filename;
use crate::pdf::png_to_pdf;
use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Time allowed for each loading indicator to detach
const LOADING_SELECTOR_BUDGET: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const SCROLL_STEP_PX: u32 = 900;
const SCROLL_PAUSE_MS: u32 = 300;

pub(super) async fn render_to_pdf(
    browser: &Browser,
    options: &BrowserOptions,
    url: &str,
    out_dir: &Path,
) -> Result<RenderedPage> {
    let page = browser.new_page("about:blank").await?;
    let result = render_inner(&page, options, url, out_dir).await;
    let _ = page.close().await;
    result
}

async fn render_inner(
    page: &Page,
    options: &BrowserOptions,
    url: &str,
    out_dir: &Path,
) -> Result<RenderedPage> {
    let render = &options.render;
    let timeout = Duration::from_millis(render.timeout_ms);

    page.execute(SetUserAgentOverrideParams::new(options.user_agent.clone()))
        .await?;
    navigate(page, url, timeout).await?;
    wait_for_settle(page, options, timeout).await;

    let title = page.get_title().await.ok().flatten();
    let path = out_dir.join(page_filename(title.as_deref(), url));

    if options.skip_existing && path.exists() {
        debug!("Rendered page already exists: {}", path.display());
        return Ok(RenderedPage {
            path,
            provenance: Provenance::Existing,
        });
    }

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let (width, height) = render.paper_format.dimensions_inches();
    let params = PrintToPdfParams::builder()
        .print_background(true)
        .paper_width(width)
        .paper_height(height)
        .build();

    let (bytes, provenance) = match page.pdf(params).await {
        Ok(bytes) => (bytes, Provenance::Printed),
        Err(e) if render.screenshot_fallback => {
            warn!("Print to PDF failed for {} ({}), using screenshot", url, e);
            let png = page
                .screenshot(
                    ScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Png)
                        .full_page(true)
                        .build(),
                )
                .await
                .context("taking screenshot")?;
            (png_to_pdf(&png)?, Provenance::Screenshot)
        }
        Err(e) => return Err(e).context("printing page to PDF"),
    };

    write_atomically(&path, &bytes).await?;
    debug!("Rendered {} -> {} ({})", url, path.display(), provenance);
    Ok(RenderedPage { path, provenance })
}

/// Navigates with the configured timeout
pub(super) async fn navigate(page: &Page, url: &str, timeout: Duration) -> Result<()> {
    tokio::time::timeout(timeout, page.goto(url))
        .await
        .map_err(|_| anyhow::anyhow!("Navigation timed out after {:?} for {}", timeout, url))?
        .map_err(|e| anyhow::anyhow!("Navigation failed for {}: {}", url, e))?;
    Ok(())
}

/// Runs every configured wait; none of them fail the render
async fn wait_for_settle(page: &Page, options: &BrowserOptions, timeout: Duration) {
    let render = &options.render;

    match render.wait_until {
        WaitUntil::DomContentLoaded => {
            evaluate_with_timeout(page, scripts::WAIT_FOR_READY, timeout).await;
        }
        WaitUntil::Load => {
            evaluate_with_timeout(page, scripts::WAIT_FOR_LOAD, timeout).await;
        }
        WaitUntil::NetworkIdle => {
            evaluate_with_timeout(page, scripts::WAIT_FOR_LOAD, timeout).await;
            wait_for_network_idle(page, timeout).await;
        }
    }

    if let Some(selector) = &render.wait_selector {
        if !poll_until(page, &scripts::selector_present(selector), timeout).await {
            warn!("Timeout waiting for selector {}", selector);
        }
    }

    if let Some(text) = &render.wait_text {
        if !poll_until(page, &scripts::text_visible(text), timeout).await {
            warn!("Timeout waiting for text {:?}", text);
        }
    }

    for selector in scripts::LOADING_SELECTORS {
        poll_until(page, &scripts::selector_absent(selector), LOADING_SELECTOR_BUDGET).await;
    }
    let loading_text = scripts::no_visible_text_matching(scripts::LOADING_TEXT_PATTERN);
    poll_until(page, &loading_text, LOADING_SELECTOR_BUDGET).await;

    if render.auto_scroll && render.max_scrolls > 0 {
        let script = scripts::auto_scroll(render.max_scrolls, SCROLL_STEP_PX, SCROLL_PAUSE_MS);
        evaluate_with_timeout(page, &script, timeout).await;
    }

    if render.extra_wait_ms > 0 {
        tokio::time::sleep(Duration::from_millis(render.extra_wait_ms)).await;
    }
}

async fn evaluate_with_timeout(page: &Page, script: &str, timeout: Duration) {
    match tokio::time::timeout(timeout, page.evaluate(script.to_string())).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("Script evaluation failed: {}", e),
        Err(_) => debug!("Script evaluation timed out"),
    }
}

/// Polls a boolean expression until it is true or `budget` runs out
async fn poll_until(page: &Page, expression: &str, budget: Duration) -> bool {
    let deadline = Instant::now() + budget;
    loop {
        let satisfied = match page.evaluate(expression.to_string()).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(_) => false,
        };
        if satisfied {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Waits until the resource count stops growing for two consecutive polls
async fn wait_for_network_idle(page: &Page, budget: Duration) {
    let deadline = Instant::now() + budget;
    let mut last: Option<u64> = None;
    let mut stable_polls = 0;

    while Instant::now() < deadline {
        let count = match page.evaluate(scripts::RESOURCE_COUNT.to_string()).await {
            Ok(result) => result.into_value::<u64>().ok(),
            Err(_) => None,
        };
        if count.is_some() && count == last {
            stable_polls += 1;
            if stable_polls >= 2 {
                return;
            }
        } else {
            stable_polls = 0;
        }
        last = count;
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    debug!("Network did not go idle within {:?}", budget);
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut part = path.as_os_str().to_os_string();
    part.push(".part");
    let part = std::path::PathBuf::from(part);

    if let Err(e) = tokio::fs::write(&part, bytes).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e).with_context(|| format!("writing {}", part.display()));
    }
    tokio::fs::rename(&part, path)
        .await
        .with_context(|| format!("renaming into {}", path.display()))
}
