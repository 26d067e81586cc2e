//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Sniffing whether a response is a PDF
//! - Streaming PDF bodies to disk under a sanitized name
//! - Returning capped HTML bodies for pages that are not PDFs
//! - Error classification

use super::filename::pdf_filename;
use crate::config::{CrawlConfig, HttpConfig};
use crate::url::looks_like_pdf;
use reqwest::{redirect::Policy, Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Failure of a single acquisition strategy
///
/// None of these abort a crawl; the orchestrator moves on to the next
/// strategy or the next link.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} did not return a PDF")]
    NotPdf { url: String },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("browser strategy failed: {0}")]
    Browser(String),

    #[error("no rewrite rule applies to {0}")]
    NoRewrite(String),
}

impl FetchError {
    fn network(url: &str, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            source,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true for failures caused by the remote side
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Status { .. })
    }
}

/// A PDF materialized on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPdf {
    pub path: PathBuf,
    /// The file already existed and no bytes were written
    pub skipped_existing: bool,
}

/// Body of a response that turned out not to be a PDF
#[derive(Debug, Clone)]
pub struct PageBody {
    /// URL after redirects
    pub final_url: String,
    /// Decoded HTML, truncated to the configured cap
    pub html: String,
}

/// Outcome of a successful GET
#[derive(Debug)]
pub enum Fetched {
    Pdf(FetchedPdf),
    NotPdf(PageBody),
}

/// Builds an HTTP client with the configured user agent, timeouts and
/// redirect limit
///
/// # Example
///
/// ```no_run
/// use pdf_harvest::config::HttpConfig;
/// use pdf_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a response should be treated as a PDF
///
/// Either signal suffices: a `Content-Type` containing `application/pdf`, or
/// a final URL whose path ends in `.pdf`. A `.pdf` that only appears in the
/// query or fragment does not count.
///
/// # Examples
///
/// ```
/// use pdf_harvest::crawler::is_pdf_response;
///
/// assert!(is_pdf_response(Some("application/pdf"), "https://e.com/view.html"));
/// assert!(is_pdf_response(Some("text/html"), "https://e.com/report.pdf?token=1"));
/// assert!(!is_pdf_response(None, "https://e.com/index.html"));
/// assert!(!is_pdf_response(Some("text/html"), "https://e.com/viewer?file=a.pdf"));
/// ```
pub fn is_pdf_response(content_type: Option<&str>, final_url: &str) -> bool {
    let has_pdf_type = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
        .unwrap_or(false);
    has_pdf_type || path_looks_like_pdf(final_url)
}

fn path_looks_like_pdf(final_url: &str) -> bool {
    match Url::parse(final_url) {
        Ok(parsed) => looks_like_pdf(parsed.path()),
        Err(_) => final_url
            .split(|c| c == '?' || c == '#')
            .next()
            .map(looks_like_pdf)
            .unwrap_or(false),
    }
}

/// Downloads URLs into an output directory
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    skip_existing: bool,
    max_html_bytes: usize,
}

impl Fetcher {
    pub fn new(client: Client, crawl: &CrawlConfig) -> Self {
        Self {
            client,
            skip_existing: crawl.skip_existing,
            max_html_bytes: crawl.max_html_bytes,
        }
    }

    /// GETs `url`, saving it under `out_dir` if it is a PDF
    ///
    /// # Request Flow
    ///
    /// 1. GET with redirects followed; non-2xx → `FetchError::Status`
    /// 2. Not a PDF → `Fetched::NotPdf` with the capped HTML body
    /// 3. Name from `Content-Disposition`, else the final URL
    /// 4. Existing file and skip-existing → returned untouched
    /// 5. Body streamed chunk by chunk into `<name>.part`, then renamed
    pub async fn fetch(&self, url: &str, out_dir: &Path) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = header_value(&response, reqwest::header::CONTENT_TYPE);

        if !is_pdf_response(content_type.as_deref(), &final_url) {
            tracing::debug!("Not a PDF ({:?}): {}", content_type, url);
            let html = self.read_capped_text(response, url).await?;
            return Ok(Fetched::NotPdf(PageBody { final_url, html }));
        }

        let disposition = header_value(&response, reqwest::header::CONTENT_DISPOSITION);
        let name = pdf_filename(disposition.as_deref(), &final_url);
        let path = out_dir.join(&name);

        if self.skip_existing && path.exists() {
            tracing::info!("Already have {}, skipping download", path.display());
            return Ok(Fetched::Pdf(FetchedPdf {
                path,
                skipped_existing: true,
            }));
        }

        self.stream_to_file(response, url, &path).await?;
        tracing::info!("Saved PDF {}", path.display());
        Ok(Fetched::Pdf(FetchedPdf {
            path,
            skipped_existing: false,
        }))
    }

    /// Like `fetch`, but a non-PDF response is a failure
    pub async fn fetch_pdf(&self, url: &str, out_dir: &Path) -> Result<FetchedPdf, FetchError> {
        match self.fetch(url, out_dir).await? {
            Fetched::Pdf(pdf) => Ok(pdf),
            Fetched::NotPdf(_) => Err(FetchError::NotPdf {
                url: url.to_string(),
            }),
        }
    }

    async fn read_capped_text(&self, mut response: Response, url: &str) -> Result<String, FetchError> {
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::network(url, e))?
        {
            let room = self.max_html_bytes.saturating_sub(body.len());
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!("HTML body of {} truncated at {} bytes", url, self.max_html_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn stream_to_file(&self, response: Response, url: &str, path: &Path) -> Result<(), FetchError> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| FetchError::io(dir, e))?;
        }

        let part = part_path(path);
        let result = write_body(response, url, &part).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&part).await;
            return result;
        }

        tokio::fs::rename(&part, path)
            .await
            .map_err(|e| FetchError::io(path, e))
    }
}

async fn write_body(mut response: Response, url: &str, part: &Path) -> Result<(), FetchError> {
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| FetchError::io(part, e))?;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::network(url, e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(part, e))?;
    }
    file.flush().await.map_err(|e| FetchError::io(part, e))?;
    Ok(())
}

/// `<dir>/<name>.part`, the in-progress name of a download
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(skip_existing: bool) -> Fetcher {
        let crawl = CrawlConfig {
            skip_existing,
            max_html_bytes: 64,
            ..CrawlConfig::default()
        };
        Fetcher::new(build_http_client(&HttpConfig::default()).unwrap(), &crawl)
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_content_type_is_case_insensitive() {
        assert!(is_pdf_response(Some("Application/PDF; charset=binary"), "https://e.com/x"));
    }

    #[test]
    fn test_pdf_in_query_is_not_a_pdf_response() {
        assert!(!is_pdf_response(
            Some("text/html"),
            "https://docs.google.com/viewer?url=https://x.org/a.pdf"
        ));
        assert!(!is_pdf_response(None, "https://e.com/page#a.pdf"));
        assert!(is_pdf_response(None, "https://e.com/files/A.PDF#page=2"));
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/tmp/out/a.pdf")),
            PathBuf::from("/tmp/out/a.pdf.part")
        );
    }

    #[tokio::test]
    async fn test_fetch_pdf_by_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/view.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .insert_header("content-disposition", "attachment; filename=\"notes.pdf\"")
                    .set_body_bytes(b"%PDF-1.4 body".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/view.html", server.uri());
        let fetched = test_fetcher(true).fetch_pdf(&url, dir.path()).await.unwrap();

        assert_eq!(fetched.path, dir.path().join("notes.pdf"));
        assert!(!fetched.skipped_existing);
        assert_eq!(std::fs::read(&fetched.path).unwrap(), b"%PDF-1.4 body");
        assert!(!dir.path().join("notes.pdf.part").exists());
    }

    #[tokio::test]
    async fn test_fetch_pdf_by_url_suffix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/octet-stream")
                    .set_body_bytes(b"%PDF-1.4".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/report.pdf?token=1", server.uri());
        let fetched = test_fetcher(true).fetch_pdf(&url, dir.path()).await.unwrap();
        assert_eq!(fetched.path, dir.path().join("report.pdf"));
    }

    #[tokio::test]
    async fn test_html_is_returned_capped() {
        let server = MockServer::start().await;
        let html = format!("<html><body>{}</body></html>", "x".repeat(200));
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(html),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/page", server.uri());
        match test_fetcher(true).fetch(&url, dir.path()).await.unwrap() {
            Fetched::NotPdf(page) => {
                assert_eq!(page.html.len(), 64);
                assert!(page.final_url.ends_with("/page"));
            }
            other => panic!("expected NotPdf, got {:?}", other),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_long_multibyte_disposition_name_is_written() {
        let server = MockServer::start().await;
        let disposition = format!(
            "attachment; filename*=UTF-8''{}.pdf",
            urlencoding::encode(&"講義".repeat(60))
        );
        Mock::given(method("GET"))
            .and(path("/lecture"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .insert_header("content-disposition", disposition.as_str())
                    .set_body_bytes(b"%PDF-1.4".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/lecture", server.uri());
        let fetched = test_fetcher(true).fetch_pdf(&url, dir.path()).await.unwrap();
        assert!(fetched.path.exists());
        assert!(fetched.path.file_name().unwrap().len() <= 255);
    }

    #[tokio::test]
    async fn test_html_viewer_with_pdf_query_is_not_saved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/viewer"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body>viewer</body></html>"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/viewer?file=lecture.pdf", server.uri());
        let fetched = test_fetcher(true).fetch(&url, dir.path()).await.unwrap();
        assert!(matches!(fetched, Fetched::NotPdf(_)));
        assert!(!dir.path().join("viewer.pdf").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_pdf_rejects_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let result = test_fetcher(true).fetch_pdf(&server.uri(), dir.path()).await;
        assert!(matches!(result, Err(FetchError::NotPdf { .. })));
    }

    #[tokio::test]
    async fn test_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/missing.pdf", server.uri());
        let err = test_fetcher(true).fetch(&url, dir.path()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_skip_existing_leaves_file_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"new bytes".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"old bytes").unwrap();
        let url = format!("{}/a.pdf", server.uri());

        let fetched = test_fetcher(true).fetch_pdf(&url, dir.path()).await.unwrap();
        assert!(fetched.skipped_existing);
        assert_eq!(std::fs::read(&fetched.path).unwrap(), b"old bytes");

        let fetched = test_fetcher(false).fetch_pdf(&url, dir.path()).await.unwrap();
        assert!(!fetched.skipped_existing);
        assert_eq!(std::fs::read(&fetched.path).unwrap(), b"new bytes");
    }
}
