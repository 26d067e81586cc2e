//! Output filename derivation
//!
//! Every artifact written by the harvester is named through these helpers,
//! so no server-supplied name can escape the output directory.

use url::Url;

/// Longest name kept after sanitization, in characters
const MAX_FILENAME_CHARS: usize = 200;

/// Byte budget for a sanitized name
///
/// Filesystems cap a path component at 255 bytes and `.pdf.part` may still
/// be appended.
const MAX_FILENAME_BYTES: usize = 240;

/// Name used when nothing usable survives sanitization
pub const DEFAULT_FILENAME: &str = "file.pdf";

/// Makes a suggested name safe to use as a single path component
///
/// The name is URL-decoded and trimmed, line breaks become spaces, and the
/// characters `< > : " / \ | ? *` plus all control characters become `_`.
/// The result is capped at 200 characters and 240 UTF-8 bytes, cut on a
/// character boundary. A name left empty, or made only of dots and
/// whitespace, falls back to `file.pdf`.
///
/// # Examples
///
/// ```
/// use pdf_harvest::crawler::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
/// assert_eq!(sanitize_filename("a%20b.pdf"), "a b.pdf");
/// assert_eq!(sanitize_filename("   "), "file.pdf");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let decoded = urlencoding::decode(name)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| name.to_string());
    let mut cleaned: String = decoded
        .trim()
        .chars()
        .map(|c| match c {
            '\r' | '\n' => ' ',
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_FILENAME_CHARS)
        .collect();
    truncate_to_bytes(&mut cleaned, MAX_FILENAME_BYTES);

    if cleaned.chars().all(|c| c == '.' || c.is_whitespace()) {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned
    }
}

fn truncate_to_bytes(name: &mut String, max: usize) {
    if name.len() <= max {
        return;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name.truncate(end);
}

/// Appends `.pdf` unless the name already ends with it (case-insensitive)
pub fn ensure_pdf_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}

/// Extracts the filename from a `Content-Disposition` header value
///
/// Both `filename="name.pdf"` and the RFC 5987 `filename*=UTF-8''name.pdf`
/// forms are understood; the encoded form wins when both are present. The
/// returned name is not yet sanitized.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let lower = header.to_ascii_lowercase();

    if let Some(start) = lower.find("filename*=") {
        let rest = &header[start + 10..];
        let encoded = match rest.find("''") {
            Some(pos) => &rest[pos + 2..],
            None => rest,
        };
        let encoded = encoded.split(';').next().unwrap_or("").trim().trim_matches('"');
        if let Ok(decoded) = urlencoding::decode(encoded) {
            let name = decoded.trim().to_string();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }

    if let Some(start) = lower.find("filename=") {
        let rest = &header[start + 9..];
        let name = match rest.strip_prefix('"') {
            Some(quoted) => quoted.split('"').next(),
            None => rest.split(';').next(),
        };
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
    }

    None
}

/// Derives a `.pdf` filename from the last path segment of a URL
///
/// URLs with no usable path tail are named `download.pdf`.
pub fn derive_filename_from_url(url: &str) -> String {
    let tail = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "download".to_string());
    sanitize_filename(&ensure_pdf_extension(&tail))
}

/// Picks the artifact name for a downloaded PDF
///
/// Preference order: `Content-Disposition`, then the final URL's path tail.
pub fn pdf_filename(content_disposition: Option<&str>, final_url: &str) -> String {
    match content_disposition.and_then(filename_from_content_disposition) {
        Some(name) => ensure_pdf_extension(&sanitize_filename(&name)),
        None => derive_filename_from_url(final_url),
    }
}

/// Picks the artifact name for a rendered web page
///
/// The page title is used when present; otherwise host and path joined with
/// `_`. Falls back to `page.pdf`.
pub fn page_filename(title: Option<&str>, url: &str) -> String {
    let base = match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => match Url::parse(url) {
            Ok(parsed) => format!("{}{}", parsed.host_str().unwrap_or(""), parsed.path())
                .replace('/', "_")
                .trim_matches('_')
                .to_string(),
            Err(_) => String::new(),
        },
    };
    let base = if base.trim().is_empty() {
        "page".to_string()
    } else {
        base
    };
    ensure_pdf_extension(&sanitize_filename(&base))
}
