//! URL handling module for PDF-Harvest
//!
//! This module provides visited-set normalization, host pattern matching,
//! cloud viewer rewriting, and the classification that picks an acquisition
//! path for each link.

mod cloud;
mod matcher;
mod normalize;

use crate::config::CloudConfig;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

// Re-export main functions
pub use cloud::{rewrite_cloud_url, CloudHost};
pub use matcher::{matches_any, matches_host_pattern};
pub use normalize::{is_http_url, normalize_url};

/// Acquisition path suggested for a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// Path or query names a `.pdf` file; fetch it directly
    DirectPdf,
    /// Cloud viewer URL that needs a host-specific rewrite
    CloudDoc(CloudHost),
    /// Anything else: scrape it for PDF links and optionally render it
    GenericPage,
}

fn pdf_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.pdf(?:[?#].*)?$").expect("valid pdf regex"))
}

/// Returns true if the URL text ends in `.pdf`, ignoring any trailing query
/// or fragment
///
/// # Examples
///
/// ```
/// use pdf_harvest::url::looks_like_pdf;
///
/// assert!(looks_like_pdf("https://example.com/report.PDF"));
/// assert!(looks_like_pdf("https://example.com/report.pdf?token=1"));
/// assert!(!looks_like_pdf("https://example.com/report.pdf.html"));
/// ```
pub fn looks_like_pdf(url: &str) -> bool {
    pdf_suffix_regex().is_match(url)
}

/// Identifies the cloud service a URL's host belongs to, if any
pub fn cloud_host(url: &Url, config: &CloudConfig) -> Option<CloudHost> {
    let host = url.host_str()?;
    if matches_any(&config.drive_hosts, host) {
        Some(CloudHost::Drive)
    } else if matches_any(&config.docs_hosts, host) {
        Some(CloudHost::Docs)
    } else {
        None
    }
}

/// Classifies a URL into its first-choice acquisition path
///
/// Priority order:
/// 1. A `.pdf` path (ignoring query/fragment) is fetched directly, whatever
///    the host
/// 2. A configured Drive or Docs host gets its viewer URL rewritten
/// 3. Everything else is a generic page
///
/// The crawler still falls back along the chain when the first choice
/// fails; this only names where the chain starts.
///
/// # Examples
///
/// ```
/// use pdf_harvest::config::CloudConfig;
/// use pdf_harvest::url::{classify_url, CloudHost, UrlKind};
///
/// let cloud = CloudConfig::default();
/// assert_eq!(classify_url("https://example.com/a.pdf", &cloud), UrlKind::DirectPdf);
/// assert_eq!(
///     classify_url("https://drive.google.com/file/d/X/view", &cloud),
///     UrlKind::CloudDoc(CloudHost::Drive)
/// );
/// assert_eq!(classify_url("https://example.com/", &cloud), UrlKind::GenericPage);
/// ```
pub fn classify_url(url: &str, config: &CloudConfig) -> UrlKind {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return UrlKind::GenericPage,
    };

    if looks_like_pdf(parsed.path()) || looks_like_pdf(url) {
        return UrlKind::DirectPdf;
    }

    match cloud_host(&parsed, config) {
        Some(host) => UrlKind::CloudDoc(host),
        None => UrlKind::GenericPage,
    }
}
