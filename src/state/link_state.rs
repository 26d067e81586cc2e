/// Link state definitions for tracking traversal progress
///
/// Every URL admitted past the visited/depth gate moves from `Unvisited` to
/// exactly one terminal state, after which it stays in the visited set.
use std::fmt;

/// Represents the state of a link during a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Discovered but not yet processed
    Unvisited,

    // ===== Terminal Success States =====
    /// Fetched directly and confirmed to be a PDF
    PdfDownloaded,

    /// Obtained through a cloud viewer rewrite, confirm page, or browser download
    CloudDocResolved,

    /// Treated as a web page: scraped for PDF links and/or rendered
    GenericPageProcessed,

    // ===== Terminal Error States =====
    /// Every applicable strategy failed
    Failed,
}

impl LinkState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unvisited)
    }

    /// Returns true if the link yielded a PDF file of its own
    pub fn produced_pdf(&self) -> bool {
        matches!(self, Self::PdfDownloaded | Self::CloudDocResolved)
    }

    /// Returns true if a transition from `self` to `next` is allowed
    ///
    /// Only `Unvisited` may move, and only to a terminal state.
    pub fn can_transition_to(&self, next: LinkState) -> bool {
        matches!(self, Self::Unvisited) && next.is_terminal()
    }

    /// Short machine-readable name, used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvisited => "unvisited",
            Self::PdfDownloaded => "pdf_downloaded",
            Self::CloudDocResolved => "cloud_doc_resolved",
            Self::GenericPageProcessed => "generic_page_processed",
            Self::Failed => "failed",
        }
    }

    /// Returns all terminal states, in report order
    pub fn terminal_states() -> [Self; 4] {
        [
            Self::PdfDownloaded,
            Self::CloudDocResolved,
            Self::GenericPageProcessed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
