//! Run summary types and console output

use crate::browser::RenderedPage;
use crate::crawler::{CrawlCounts, LinkOutcome};
use crate::state::LinkState;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Result of traversing one seed PDF
#[derive(Debug, Clone)]
pub struct SeedReport {
    /// The seed file
    pub seed: PathBuf,

    /// Directory its artifacts were written to
    pub out_dir: PathBuf,

    pub counts: CrawlCounts,

    /// Terminal state of every admitted URL, in visit order
    pub outcomes: Vec<LinkOutcome>,

    pub renders: Vec<RenderedPage>,

    /// Set when the seed could not be opened; counts are then all zero
    pub error: Option<String>,
}

impl SeedReport {
    /// Report for a seed that could not be read
    pub fn unreadable(seed: PathBuf, out_dir: PathBuf, error: String) -> Self {
        Self {
            seed,
            out_dir,
            counts: CrawlCounts::default(),
            outcomes: Vec::new(),
            renders: Vec::new(),
            error: Some(error),
        }
    }

    /// Number of recorded outcomes in `state`
    pub fn count_state(&self, state: LinkState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

/// Aggregate result of a whole invocation
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Root output directory
    pub output_dir: PathBuf,
    pub render_enabled: bool,
    pub seeds: Vec<SeedReport>,
}

impl RunSummary {
    pub fn new(output_dir: PathBuf, render_enabled: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            output_dir,
            render_enabled,
            seeds: Vec::new(),
        }
    }

    /// Marks the run as finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Sum of every seed's counters
    pub fn totals(&self) -> CrawlCounts {
        let mut totals = CrawlCounts::default();
        for seed in &self.seeds {
            totals += seed.counts;
        }
        totals
    }

    pub fn seeds_processed(&self) -> usize {
        self.seeds.len()
    }

    /// Seeds that could not be opened
    pub fn unreadable_seeds(&self) -> impl Iterator<Item = &SeedReport> {
        self.seeds.iter().filter(|s| s.error.is_some())
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Percentage of attempted URLs that produced a PDF
    pub fn success_rate(&self) -> f64 {
        let totals = self.totals();
        if totals.attempted == 0 {
            return 0.0;
        }
        (totals.succeeded as f64 / totals.attempted as f64) * 100.0
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    let totals = summary.totals();

    println!("\n=== Harvest Summary ===");
    println!("  Seeds processed:   {}", summary.seeds_processed());
    println!("  Links found:       {}", totals.links_found);
    println!("  Links attempted:   {}", totals.attempted);
    println!("  PDFs obtained:     {}", totals.succeeded);
    if summary.render_enabled {
        println!("  Pages rendered:    {}", totals.rendered);
    }

    let unreadable: Vec<_> = summary.unreadable_seeds().collect();
    if !unreadable.is_empty() {
        println!("  Unreadable seeds:  {}", unreadable.len());
        for seed in unreadable {
            println!("    - {}", seed.seed.display());
        }
    }

    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration:          {}s", seconds);
    }
    println!("  Output directory:  {}", summary.output_dir.display());
}
