//! Seed PDF discovery

use crate::HarvestError;
use std::fs;
use std::path::{Path, PathBuf};

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Lists the seed PDFs under `input`
///
/// A file input is returned as-is if it has a `.pdf` extension. A directory
/// is scanned for `*.pdf` files, descending into subdirectories when
/// `recursive` is set. Results are sorted.
///
/// # Errors
///
/// `InputNotFound` if `input` does not exist; `NoPdfsFound` if nothing
/// qualifies.
pub fn gather_pdfs(input: &Path, recursive: bool) -> crate::Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(HarvestError::InputNotFound(input.to_path_buf()));
    }

    let mut found = Vec::new();
    if input.is_file() {
        if has_pdf_extension(input) {
            found.push(input.to_path_buf());
        }
    } else {
        collect_dir(input, recursive, &mut found)?;
    }

    if found.is_empty() {
        return Err(HarvestError::NoPdfsFound(input.to_path_buf()));
    }
    found.sort();
    Ok(found)
}

fn collect_dir(dir: &Path, recursive: bool, found: &mut Vec<PathBuf>) -> crate::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_dir(&path, recursive, found)?;
            }
        } else if path.is_file() && has_pdf_extension(&path) {
            found.push(path);
        }
    }
    Ok(())
}
