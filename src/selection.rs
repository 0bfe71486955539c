//! Sample selection and file splitting.
//!
//! Selection expressions such as `1,3,5-10` pick samples by their 1-based
//! position in a file. A file can be split into a "modified" and an
//! "unmodified" group, each written back out in the tracer's own format next
//! to the input.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ParserConfig;
use crate::error::{Result, TracerError};
use crate::models::Sample;
use crate::parser::SampleParser;
use crate::parser::writer::write_samples;

/// Parse a selection expression into sorted, unique positions in `1..=max`.
///
/// Parts are separated by commas and are either a number or an inclusive
/// `start-end` range. A reversed range selects nothing. Positions outside
/// `1..=max` are ignored, but an expression selecting nothing at all is an
/// error.
pub fn parse_selection(input: &str, max: usize) -> Result<Vec<usize>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TracerError::invalid_selection(input, "empty selection"));
    }

    let mut selected = BTreeSet::new();
    for part in trimmed.split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_position(input, start)?;
                let end = parse_position(input, end)?;
                selected.extend(start..=end);
            }
            None => {
                selected.insert(parse_position(input, part)?);
            }
        }
    }

    let in_range: Vec<usize> = selected
        .into_iter()
        .filter(|n| (1..=max).contains(n))
        .collect();
    if in_range.is_empty() {
        return Err(TracerError::invalid_selection(
            input,
            format!("no samples selected within 1-{}", max),
        ));
    }
    Ok(in_range)
}

fn parse_position(input: &str, text: &str) -> Result<usize> {
    text.trim().parse::<usize>().map_err(|_| {
        TracerError::invalid_selection(input, format!("'{}' is not a sample number", text.trim()))
    })
}

/// Partition samples into the modified and unmodified groups.
///
/// Overlapping selections are rejected unless `allow_overlap` is set, in
/// which case a sample in both goes to the modified group only.
pub fn split_samples(
    samples: &[Sample],
    modified: &[usize],
    unmodified: &[usize],
    allow_overlap: bool,
) -> Result<(Vec<Sample>, Vec<Sample>)> {
    let overlap: Vec<usize> = modified
        .iter()
        .copied()
        .filter(|n| unmodified.contains(n))
        .collect();
    if !overlap.is_empty() {
        if !allow_overlap {
            return Err(TracerError::invalid_selection(
                format!("{:?} / {:?}", modified, unmodified),
                format!("samples {:?} appear in both selections", overlap),
            ));
        }
        warn!(
            "Samples {:?} appear in both selections; writing them as modified",
            overlap
        );
    }

    let mut modified_samples = Vec::new();
    let mut unmodified_samples = Vec::new();
    for (position, sample) in (1..).zip(samples) {
        if modified.contains(&position) {
            modified_samples.push(sample.clone());
        } else if unmodified.contains(&position) {
            unmodified_samples.push(sample.clone());
        }
    }
    Ok((modified_samples, unmodified_samples))
}

/// `<stem>_Modified.csv` and `<stem>_Unmodified.csv` beside the input, with a
/// `_<n>` counter added until neither exists
pub fn split_output_paths(input: &Path) -> (PathBuf, PathBuf) {
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "samples".to_string());

    let paths = |suffix: String| {
        (
            dir.join(format!("{}_Modified{}.csv", stem, suffix)),
            dir.join(format!("{}_Unmodified{}.csv", stem, suffix)),
        )
    };

    let mut candidate = paths(String::new());
    let mut counter = 1;
    while candidate.0.exists() || candidate.1.exists() {
        candidate = paths(format!("_{}", counter));
        counter += 1;
    }
    candidate
}

/// Result of splitting one file
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub modified_path: PathBuf,
    pub unmodified_path: PathBuf,
    pub modified_count: usize,
    pub unmodified_count: usize,
    pub total_samples: usize,
}

/// Split a tracer export by two selection expressions
pub fn split_file(
    path: &Path,
    modified: &str,
    unmodified: &str,
    allow_overlap: bool,
    config: &ParserConfig,
) -> Result<SplitOutcome> {
    let samples = SampleParser::new(config.clone()).parse_file(path)?.samples;
    if samples.is_empty() {
        return Err(TracerError::ProcessingFailed {
            path: path.to_path_buf(),
            reason: "no samples found; the file has no 'Sample No.' lines".to_string(),
        });
    }

    let modified = parse_selection(modified, samples.len())?;
    let unmodified = parse_selection(unmodified, samples.len())?;
    let (modified_samples, unmodified_samples) =
        split_samples(&samples, &modified, &unmodified, allow_overlap)?;

    let (modified_path, unmodified_path) = split_output_paths(path);
    for (target, group) in [
        (&modified_path, &modified_samples),
        (&unmodified_path, &unmodified_samples),
    ] {
        let mut writer = BufWriter::new(File::create(target)?);
        write_samples(&mut writer, group, &config.missing_value_token)?;
    }

    info!(
        "Split {} samples from {}: {} modified, {} unmodified",
        samples.len(),
        path.display(),
        modified_samples.len(),
        unmodified_samples.len()
    );

    Ok(SplitOutcome {
        modified_path,
        unmodified_path,
        modified_count: modified_samples.len(),
        unmodified_count: unmodified_samples.len(),
        total_samples: samples.len(),
    })
}
