//! Cloud document acquisition chain
//!
//! Strategies, tried in order until one yields a PDF:
//! 1. Rewrite the viewer URL to its export/download endpoint and fetch it
//! 2. If that returns an HTML interstitial, follow its confirm link or form
//! 3. Open the viewer in a browser and click its Download control
//!
//! Each strategy returns `Result<FetchedPdf, FetchError>`; only the last
//! failure is reported to the caller.

use super::fetcher::{FetchError, Fetched, FetchedPdf, Fetcher, PageBody};
use super::parser::find_confirm_url;
use crate::browser::BrowserBackend;
use crate::url::{rewrite_cloud_url, CloudHost};
use std::path::Path;
use tracing::debug;
use url::Url;

/// Resolves a cloud viewer URL to a local PDF
///
/// `browser` is `None` when browser downloads are disabled.
pub async fn resolve_cloud_doc(
    fetcher: &Fetcher,
    browser: Option<&dyn BrowserBackend>,
    url: &Url,
    host: CloudHost,
    out_dir: &Path,
) -> Result<FetchedPdf, FetchError> {
    let mut last_error = FetchError::NoRewrite(url.to_string());

    match rewrite_cloud_url(url, host) {
        Some(direct) => {
            debug!("Cloud rewrite {} -> {}", url, direct);
            match export_download(fetcher, &direct, out_dir).await {
                Ok(pdf) => return Ok(pdf),
                Err(e) => {
                    debug!("Export download failed: {}", e);
                    last_error = e;
                }
            }
        }
        None => debug!("No rewrite rule for {}", url),
    }

    match browser {
        Some(browser) => browser_download(browser, url, out_dir).await,
        None => Err(last_error),
    }
}

/// Fetches a rewritten URL, passing any HTML response to the confirm step
pub async fn export_download(
    fetcher: &Fetcher,
    direct: &Url,
    out_dir: &Path,
) -> Result<FetchedPdf, FetchError> {
    match fetcher.fetch(direct.as_str(), out_dir).await? {
        Fetched::Pdf(pdf) => Ok(pdf),
        Fetched::NotPdf(page) => confirm_download(fetcher, &page, out_dir).await,
    }
}

/// Follows the "download anyway" target of a virus-scan interstitial
pub async fn confirm_download(
    fetcher: &Fetcher,
    page: &PageBody,
    out_dir: &Path,
) -> Result<FetchedPdf, FetchError> {
    let not_pdf = || FetchError::NotPdf {
        url: page.final_url.clone(),
    };
    let base = Url::parse(&page.final_url).map_err(|_| not_pdf())?;
    let confirm = find_confirm_url(&page.html, &base).ok_or_else(not_pdf)?;

    debug!("Following download confirmation {}", confirm);
    fetcher.fetch_pdf(confirm.as_str(), out_dir).await
}

/// Clicks through the viewer UI in a headless browser
pub async fn browser_download(
    browser: &dyn BrowserBackend,
    url: &Url,
    out_dir: &Path,
) -> Result<FetchedPdf, FetchError> {
    browser
        .click_download(url.as_str(), out_dir)
        .await
        .map(|path| FetchedPdf {
            path,
            skipped_existing: false,
        })
        .map_err(|e| FetchError::Browser(e.to_string()))
}
