//! PDF introspection and synthesis
//!
//! Reading side: open a document and pull outbound links out of it.
//! Writing side: wrap a raster screenshot in a one-page PDF.

mod links;
mod raster;

use crate::HarvestError;
use lopdf::Document;
use std::path::Path;

pub use links::{
    extract_annotation_links, extract_links, extract_text_links, find_text_urls, links_from_file,
    DiscoveryMethod, LinkCandidate,
};
pub use raster::png_to_pdf;

/// Opens a PDF file for link extraction
///
/// A file that cannot be parsed (corrupt, truncated, or undecryptable) is
/// reported as `HarvestError::Pdf` so the caller can skip that seed.
pub fn open_document(path: &Path) -> crate::Result<Document> {
    Document::load(path).map_err(|e| HarvestError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
