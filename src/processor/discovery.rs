//! Input discovery for batch runs
//!
//! Expands the command line inputs into a sorted list of tracer export
//! files. An input may be a file, a directory (walked recursively for CSV
//! files) or a glob pattern.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::constants::TRACER_FILE_EXTENSION;
use crate::error::{Result, TracerError};

/// Resolve inputs into unique, sorted file paths.
///
/// Fails with [`TracerError::NoInputFiles`] when nothing matches.
pub fn discover_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            let found = walk_directory(input);
            debug!("Found {} CSV files under {}", found.len(), input.display());
            files.extend(found);
        } else if input.is_file() {
            files.insert(input.clone());
        } else {
            let matched = expand_pattern(input)?;
            if matched.is_empty() {
                warn!("No files matched {}", input.display());
            }
            files.extend(matched);
        }
    }

    if files.is_empty() {
        let pattern = inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(TracerError::NoInputFiles { pattern });
    }

    Ok(files.into_iter().collect())
}

/// CSV files below a directory
fn walk_directory(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && is_tracer_file(path) {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                warn!("Error walking directory {}: {}", dir.display(), e);
            }
        }
    }
    files
}

/// Files matching a glob pattern
fn expand_pattern(pattern: &Path) -> Result<Vec<PathBuf>> {
    let text = pattern.to_string_lossy();
    let paths = glob::glob(&text).map_err(|e| {
        TracerError::configuration(format!("Invalid glob pattern '{}': {}", text, e))
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Unreadable match for {}: {}", text, e),
        }
    }
    Ok(files)
}

/// Check if a path has the tracer export extension (case-insensitive)
pub fn is_tracer_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TRACER_FILE_EXTENSION))
}
