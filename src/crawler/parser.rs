//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags)
//! - PDF links embedded in the page (<a>, <embed>, <iframe>)
//! - Page title
//! - The confirmation target of a download interstitial
//!
//! `scraper::Html` is not `Send`, so every function here parses and drops
//! the document synchronously and returns owned data.

use crate::url::looks_like_pdf;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All followable links found on the page (absolute URLs, in order)
    pub links: Vec<String>,

    /// Links that point at PDF files (absolute URLs, de-duplicated, in order)
    pub pdf_links: Vec<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Followable links:** `<a href>` except those carrying `download`.
///
/// **PDF links:** any `<a href>` (including `download` ones), `<embed src>`
/// or `<iframe src>` whose absolute URL ends in `.pdf`.
///
/// **Always excluded:** `javascript:`, `mailto:`, `tel:`, data URIs,
/// fragment-only hrefs, and anything that does not resolve to http(s).
///
/// # Example
///
/// ```
/// use pdf_harvest::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/a.pdf">A</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.pdf_links, vec!["https://example.com/a.pdf"]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
        pdf_links: extract_pdf_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Extracts PDF links from anchors, embeds and iframes
fn extract_pdf_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut found = Vec::new();

    let sources = [("a[href]", "href"), ("embed[src]", "src"), ("iframe[src]", "src")];
    for (selector, attr) in sources {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(absolute_url) = element.value().attr(attr).and_then(|v| resolve_link(v, base_url)) {
                if looks_like_pdf(&absolute_url) {
                    found.push(absolute_url);
                }
            }
        }
    }

    let mut seen = HashSet::new();
    found.retain(|url| seen.insert(url.clone()));
    found
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Finds the "download anyway" target on a Drive virus-scan interstitial
///
/// Two page shapes are recognized:
/// 1. A legacy anchor whose href is a `uc?export=download` URL carrying a
///    `confirm=` token
/// 2. A `<form>` with a hidden `confirm` input; its action URL plus all
///    hidden inputs become the query
///
/// Relative targets resolve against `base_url`, the interstitial's final URL.
pub fn find_confirm_url(html: &str, base_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    confirm_from_anchor(&document, base_url).or_else(|| confirm_from_form(&document, base_url))
}

fn confirm_from_anchor(document: &Html, base_url: &Url) -> Option<Url> {
    let selector = Selector::parse("a[href]").ok()?;
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| href.contains("export=download") && href.contains("confirm="))
        .and_then(|href| base_url.join(href).ok())
}

fn confirm_from_form(document: &Html, base_url: &Url) -> Option<Url> {
    let form_selector = Selector::parse("form").ok()?;
    let input_selector = Selector::parse("input[type='hidden'][name]").ok()?;

    let form = document.select(&form_selector).find(|form| {
        form.select(&input_selector)
            .any(|input| input.value().attr("name") == Some("confirm"))
    })?;

    let action = form.value().attr("action").map(str::trim).unwrap_or("");
    let mut target = base_url.join(action).ok()?;
    target.set_fragment(None);
    {
        let mut query = target.query_pairs_mut();
        for input in form.select(&input_selector) {
            let (name, value) = hidden_input_pair(&input);
            query.append_pair(name, value);
        }
    }
    Some(target)
}

fn hidden_input_pair<'a>(input: &ElementRef<'a>) -> (&'a str, &'a str) {
    let element = input.value();
    (
        element.attr("name").unwrap_or_default(),
        element.attr("value").unwrap_or_default(),
    )
}
