use crate::url::is_http_url;
use lopdf::{Dictionary, Document, Object, ObjectId};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// How a link was found inside a PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryMethod {
    /// Target URI of a clickable `/Link` annotation
    Annotation,
    /// Bare URL in the page's extracted text
    Text,
}

/// A URL pulled from a PDF, tagged with how it was found
///
/// Two candidates are the same link when their URL text matches; the
/// discovery method plays no part in deduplication.
#[derive(Debug, Clone)]
pub struct LinkCandidate {
    pub url: String,
    pub method: DiscoveryMethod,
}

impl PartialEq for LinkCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for LinkCandidate {}

impl std::hash::Hash for LinkCandidate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

fn text_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)https?://[^\s<>()'"]+"#).expect("valid url regex"))
}

/// Scans free text for http(s) URLs
///
/// Trailing `)`, `.`, `,` and `]` are dropped because a sentence can glue
/// them onto a bare URL.
///
/// # Examples
///
/// ```
/// use pdf_harvest::pdf::find_text_urls;
///
/// let urls = find_text_urls("See https://example.com/a.pdf. Or (https://example.com/b), thanks");
/// assert_eq!(urls, vec!["https://example.com/a.pdf", "https://example.com/b"]);
/// ```
pub fn find_text_urls(text: &str) -> Vec<String> {
    text_url_regex()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches([')', '.', ',', ']']))
        .filter(|u| is_http_url(u))
        .map(str::to_string)
        .collect()
}

/// Collects the URI targets of every `/Link` annotation in the document
///
/// Only http(s) targets survive, trimmed of surrounding whitespace. Pages or
/// annotations that fail to resolve are skipped.
pub fn extract_annotation_links(doc: &Document) -> Vec<String> {
    let mut links = Vec::new();
    for page_id in doc.get_pages().values() {
        links.extend(page_annotation_uris(doc, *page_id));
    }
    links
}

/// Collects http(s) URLs found in every page's extracted text
pub fn extract_text_links(doc: &Document) -> Vec<String> {
    let mut links = Vec::new();
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => links.extend(find_text_urls(&text)),
            Err(e) => tracing::debug!("Text extraction failed on page {}: {}", page_num, e),
        }
    }
    links
}

/// Extracts the union of annotation and text links
///
/// Annotation links come first, then text links, each group sorted, with
/// later duplicates dropped, so the traversal order is stable.
pub fn extract_links(doc: &Document) -> Vec<LinkCandidate> {
    let mut annotations = extract_annotation_links(doc);
    annotations.sort();
    let mut texts = extract_text_links(doc);
    texts.sort();

    let tagged = annotations
        .into_iter()
        .map(|url| (url, DiscoveryMethod::Annotation))
        .chain(texts.into_iter().map(|url| (url, DiscoveryMethod::Text)));

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (url, method) in tagged {
        if seen.insert(url.clone()) {
            out.push(LinkCandidate { url, method });
        }
    }
    out
}

/// Opens `path` and extracts its links
pub fn links_from_file(path: &Path) -> crate::Result<Vec<LinkCandidate>> {
    let doc = super::open_document(path)?;
    Ok(extract_links(&doc))
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn page_annotation_uris(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let page = match doc.get_object(page_id).and_then(|o| o.as_dict()) {
        Ok(dict) => dict,
        Err(_) => return Vec::new(),
    };

    let annots = match page
        .get(b"Annots")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
    {
        Some(arr) => arr,
        None => return Vec::new(),
    };

    annots
        .iter()
        .filter_map(|entry| resolve(doc, entry))
        .filter_map(|obj| obj.as_dict().ok())
        .filter(|dict| is_link_annotation(dict))
        .filter_map(|dict| link_uri(doc, dict))
        .map(|uri| uri.trim().to_string())
        .filter(|uri| is_http_url(uri))
        .collect()
}

fn is_link_annotation(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name.as_slice() == b"Link")
}

fn link_uri(doc: &Document, annot: &Dictionary) -> Option<String> {
    let action = resolve(doc, annot.get(b"A").ok()?)?.as_dict().ok()?;
    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind.as_slice() == b"URI" => {}
        _ => return None,
    }
    let uri = resolve(doc, action.get(b"URI").ok()?)?;
    match uri {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Decodes a PDF text string: UTF-16BE when it carries a BOM, else bytes as-is
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
