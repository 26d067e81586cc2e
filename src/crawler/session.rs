//! Per-seed crawl session state
//!
//! One `CrawlSession` lives for the traversal of a single seed PDF. It owns
//! the visited set and the counters, and is threaded by `&mut` through the
//! whole recursive descent.

use crate::browser::RenderedPage;
use crate::state::LinkState;
use crate::url::normalize_url;
use std::collections::HashSet;
use std::path::PathBuf;

/// Aggregate counters for a session or a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlCounts {
    /// Unique links extracted from the seed PDF itself
    pub links_found: usize,
    /// URLs that passed the visited/depth gate
    pub attempted: usize,
    /// PDF files obtained (direct, cloud, or scraped from a page)
    pub succeeded: usize,
    /// Web pages saved as PDF snapshots
    pub rendered: usize,
}

impl std::ops::AddAssign for CrawlCounts {
    fn add_assign(&mut self, other: Self) {
        self.links_found += other.links_found;
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.rendered += other.rendered;
    }
}

/// How one visited URL was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    pub url: String,
    pub depth: u32,
    pub state: LinkState,
    /// File produced for this URL, if any
    pub artifact: Option<PathBuf>,
}

/// Traversal state shared across one seed's recursive descent
#[derive(Debug, Default)]
pub struct CrawlSession {
    visited: HashSet<String>,
    pub counts: CrawlCounts,
    pub outcomes: Vec<LinkOutcome>,
    pub renders: Vec<RenderedPage>,
}

/// Identity used by the visited set
///
/// Fragments are dropped; anything that does not parse as an http(s) URL
/// is kept as its trimmed text.
pub fn visit_key(url: &str) -> String {
    match normalize_url(url) {
        Ok(normalized) => normalized.to_string(),
        Err(_) => url.trim().to_string(),
    }
}

impl CrawlSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `url` has already been admitted
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&visit_key(url))
    }

    /// Gate for traversal nodes
    ///
    /// Admits `url` unless it was seen before or `depth > max_depth`. An
    /// admitted URL is marked visited and counted as one attempt before any
    /// network call is made.
    pub fn admit(&mut self, url: &str, depth: u32, max_depth: u32) -> bool {
        if depth > max_depth {
            return false;
        }
        self.admit_leaf(url)
    }

    /// Gate for leaf downloads, which have no depth of their own
    pub fn admit_leaf(&mut self, url: &str) -> bool {
        if !self.visited.insert(visit_key(url)) {
            return false;
        }
        self.counts.attempted += 1;
        true
    }

    /// Records the terminal state of an admitted URL
    pub fn record(&mut self, url: &str, depth: u32, state: LinkState, artifact: Option<PathBuf>) {
        debug_assert!(LinkState::Unvisited.can_transition_to(state));
        if state.produced_pdf() {
            self.counts.succeeded += 1;
        }
        tracing::debug!("{} -> {}", url, state);
        self.outcomes.push(LinkOutcome {
            url: url.to_string(),
            depth,
            state,
            artifact,
        });
    }

    /// Counts a page snapshot
    pub fn record_render(&mut self, page: RenderedPage) {
        self.counts.rendered += 1;
        self.renders.push(page);
    }
}
