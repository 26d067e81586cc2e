//! Output module for harvest summaries and reports
//!
//! This module handles:
//! - Collecting per-seed results into a run summary
//! - Printing the end-of-run summary
//! - Writing an optional markdown report

mod markdown;
mod summary;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use summary::{print_summary, RunSummary, SeedReport};
