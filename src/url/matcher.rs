/// Checks if a host matches a host pattern
///
/// Two pattern forms are supported:
/// 1. Exact: `"drive.google.com"` matches only that host
/// 2. Wildcard: `"*.google.com"` matches `google.com` itself and any
///    subdomain such as `drive.google.com` or `a.b.google.com`
///
/// Comparison is ASCII case-insensitive.
///
/// # Examples
///
/// ```
/// use pdf_harvest::url::matches_host_pattern;
///
/// assert!(matches_host_pattern("*.drive.google.com", "drive.google.com"));
/// assert!(matches_host_pattern("*.google.com", "Docs.Google.com"));
/// assert!(!matches_host_pattern("*.google.com", "notgoogle.com"));
/// ```
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

/// Returns true if the host matches any pattern in the list
pub fn matches_any(patterns: &[String], host: &str) -> bool {
    patterns.iter().any(|p| matches_host_pattern(p, host))
}
