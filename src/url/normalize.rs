use crate::UrlError;
use url::Url;

/// Normalizes a URL into the key used for visited-set membership
///
/// Deduplication is by literal URL identity, so normalization only removes
/// differences that never change what a server returns:
///
/// 1. Trim surrounding whitespace; parse the URL, rejecting malformed input
/// 2. Require an `http` or `https` scheme (case-insensitive)
/// 3. Require a host
/// 4. Lowercase scheme and host, drop default ports, resolve dot segments
///    (all performed by the URL parser)
/// 5. Remove the fragment (everything after `#`)
///
/// Query strings, `www.` prefixes and trailing slashes are kept as-is.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use pdf_harvest::url::normalize_url;
///
/// let url = normalize_url("  HTTP://Example.COM:80/a/../report.pdf#page=2 ").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/report.pdf");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Returns true if the string is an absolute http(s) URL
///
/// The scheme check is case-insensitive, matching how links are read out of
/// PDF annotations and text.
pub fn is_http_url(candidate: &str) -> bool {
    let lower = candidate.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
