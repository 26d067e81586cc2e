//! Markdown report generation
//!
//! This module renders a human-readable report of a harvest run: totals,
//! one section per seed with its link outcomes, and the rendered snapshots
//! with how each was produced.

use super::summary::{RunSummary, SeedReport};
use crate::state::LinkState;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Largest number of outcome rows listed per seed
const MAX_OUTCOME_ROWS: usize = 200;

/// Writes the markdown report for `summary` to `output_path`
///
/// # Arguments
///
/// * `summary` - The finished run
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_report(summary: &RunSummary, output_path: &Path) -> crate::Result<()> {
    let markdown = format_markdown_report(summary);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_report(summary: &RunSummary) -> String {
    let mut md = String::new();
    let totals = summary.totals();

    md.push_str("# PDF Harvest Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration_seconds() {
        md.push_str(&format!("- **Duration**: {} seconds\n", duration));
    }
    md.push_str(&format!(
        "- **Output Directory**: `{}`\n\n",
        summary.output_dir.display()
    ));

    md.push_str("## Totals\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Seeds | {} |\n", summary.seeds_processed()));
    md.push_str(&format!("| Links Found | {} |\n", totals.links_found));
    md.push_str(&format!("| Attempted | {} |\n", totals.attempted));
    md.push_str(&format!("| Succeeded | {} |\n", totals.succeeded));
    if summary.render_enabled {
        md.push_str(&format!("| Rendered | {} |\n", totals.rendered));
    }
    md.push_str(&format!(
        "\n- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    for seed in &summary.seeds {
        format_seed_section(&mut md, seed);
    }

    md
}

fn format_seed_section(md: &mut String, seed: &SeedReport) {
    md.push_str(&format!("## Seed: `{}`\n\n", seed.seed.display()));

    if let Some(error) = &seed.error {
        md.push_str(&format!("Could not be read: {}\n\n", error));
        return;
    }

    md.push_str(&format!(
        "- Links found: {}, attempted: {}, succeeded: {}, rendered: {}\n",
        seed.counts.links_found, seed.counts.attempted, seed.counts.succeeded, seed.counts.rendered
    ));
    md.push_str(&format!("- Output: `{}`\n\n", seed.out_dir.display()));

    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    for state in LinkState::terminal_states() {
        let count = seed.count_state(state);
        if count > 0 {
            md.push_str(&format!("| {} | {} |\n", state, count));
        }
    }
    md.push('\n');

    if !seed.outcomes.is_empty() {
        md.push_str("| Depth | URL | State | File |\n");
        md.push_str("|-------|-----|-------|------|\n");
        for outcome in seed.outcomes.iter().take(MAX_OUTCOME_ROWS) {
            let file = outcome
                .artifact
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                outcome.depth,
                escape_cell(&outcome.url),
                outcome.state,
                escape_cell(&file)
            ));
        }
        if seed.outcomes.len() > MAX_OUTCOME_ROWS {
            md.push_str(&format!(
                "\n... and {} more\n",
                seed.outcomes.len() - MAX_OUTCOME_ROWS
            ));
        }
        md.push('\n');
    }

    if !seed.renders.is_empty() {
        md.push_str("### Rendered Pages\n\n");
        for page in &seed.renders {
            md.push_str(&format!(
                "- `{}` ({})\n",
                page.path.display(),
                page.provenance
            ));
        }
        md.push('\n');
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
