//! Crawler module for link resolution and recursive harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with PDF sniffing and streamed downloads
//! - HTML parsing for links, embedded PDFs and download interstitials
//! - The cloud document acquisition chain
//! - Per-seed traversal state and overall coordination

mod cloud;
mod coordinator;
mod fetcher;
mod filename;
mod inputs;
mod parser;
mod session;

pub use cloud::{browser_download, confirm_download, export_download, resolve_cloud_doc};
pub use coordinator::{harvest, Harvester};
pub use fetcher::{build_http_client, is_pdf_response, FetchError, Fetched, FetchedPdf, Fetcher, PageBody};
pub use filename::{
    derive_filename_from_url, ensure_pdf_extension, filename_from_content_disposition,
    page_filename, pdf_filename, sanitize_filename, DEFAULT_FILENAME,
};
pub use inputs::gather_pdfs;
pub use parser::{find_confirm_url, parse_html, ParsedPage};
pub use session::{visit_key, CrawlCounts, CrawlSession, LinkOutcome};
