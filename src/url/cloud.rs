//! Cloud document viewer URL rewriting
//!
//! Drive and Docs serve interactive viewers at their share URLs. The rules in
//! this module map those URLs to the endpoints that return file bytes.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Which cloud document service a host belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudHost {
    /// File viewer (`/file/d/<id>/view`, `/open?id=<id>`)
    Drive,
    /// Docs, Sheets and Slides editors
    Docs,
}

fn drive_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^/file/d/([^/]+)/view").expect("valid drive regex"))
}

fn doc_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^/(document|spreadsheets|presentation)/d/([^/]+)")
            .expect("valid docs regex")
    })
}

/// Rewrites a cloud viewer URL into a direct download/export URL
///
/// The scheme, host and port of the input are kept, so the result for a
/// real share link is always on the canonical service host.
///
/// Returns `None` when the URL does not follow any known viewer shape.
///
/// # Examples
///
/// ```
/// use pdf_harvest::url::{rewrite_cloud_url, CloudHost};
/// use url::Url;
///
/// let view = Url::parse("https://drive.google.com/file/d/ABC123/view").unwrap();
/// let direct = rewrite_cloud_url(&view, CloudHost::Drive).unwrap();
/// assert_eq!(direct.as_str(), "https://drive.google.com/uc?export=download&id=ABC123");
/// ```
pub fn rewrite_cloud_url(url: &Url, host: CloudHost) -> Option<Url> {
    match host {
        CloudHost::Drive => rewrite_drive_url(url),
        CloudHost::Docs => rewrite_docs_url(url),
    }
}

fn rewrite_drive_url(url: &Url) -> Option<Url> {
    let origin = url.origin().ascii_serialization();
    let path = url.path();

    let file_id = if let Some(caps) = drive_file_regex().captures(path) {
        caps.get(1).map(|m| m.as_str().to_string())
    } else if path.ends_with("/open") {
        url.query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())
    } else {
        None
    }?;

    if file_id.is_empty() {
        return None;
    }

    let mut direct = Url::parse(&format!("{}/uc", origin)).ok()?;
    direct
        .query_pairs_mut()
        .append_pair("export", "download")
        .append_pair("id", &file_id);
    Some(direct)
}

fn rewrite_docs_url(url: &Url) -> Option<Url> {
    let path = url.path();

    if is_published_sheet(path) {
        return rewrite_published_sheet(url);
    }

    let caps = doc_id_regex().captures(path)?;
    let kind = caps.get(1)?.as_str().to_ascii_lowercase();
    let doc_id = caps.get(2)?.as_str();

    // `/d/e/...` is the published form; without `pubhtml` it has no export endpoint
    if doc_id == "e" {
        return None;
    }

    let origin = url.origin().ascii_serialization();
    let export = match kind.as_str() {
        "document" => format!("{}/document/d/{}/export?format=pdf", origin, doc_id),
        "spreadsheets" => format!("{}/spreadsheets/d/{}/export?format=pdf", origin, doc_id),
        "presentation" => format!("{}/presentation/d/{}/export/pdf", origin, doc_id),
        _ => return None,
    };
    Url::parse(&export).ok()
}

fn is_published_sheet(path: &str) -> bool {
    path.contains("/spreadsheets/") && path.contains("/d/e/") && path.contains("pubhtml")
}

/// `.../pubhtml?gid=0` becomes `.../pub?gid=0&output=pdf`, keeping the
/// first value of every existing parameter in order
fn rewrite_published_sheet(url: &Url) -> Option<Url> {
    let mut params: Vec<(String, String)> = Vec::new();
    for (key, value) in url.query_pairs() {
        if !params.iter().any(|(k, _)| *k == key) {
            params.push((key.into_owned(), value.into_owned()));
        }
    }
    match params.iter_mut().find(|(k, _)| k == "output") {
        Some(entry) => entry.1 = "pdf".to_string(),
        None => params.push(("output".to_string(), "pdf".to_string())),
    }

    let mut direct = url.clone();
    direct.set_path(&url.path().replace("/pubhtml", "/pub"));
    direct.set_fragment(None);
    direct.set_query(None);
    direct.query_pairs_mut().extend_pairs(params.iter());
    Some(direct)
}
