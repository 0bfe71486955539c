//! Multi-sample tracer export parsing.
//!
//! Splits raw file text into per-sample blocks and extracts ordered
//! key/value metadata plus an optional curve table for each sample. Files
//! vary in delimiter (comma or tab), byte-order marks, quoting and in whether
//! a curve table is present at all; the parser copes with all of these and
//! never fails on content, only on I/O.

pub mod classify;
pub mod writer;

#[cfg(test)]
mod tests;

use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::ParserConfig;
use crate::constants::metadata_keys;
use crate::error::{Result, TracerError};
use crate::models::{CellValue, CurveTable, Metadata, Sample};
use classify::{BoundaryMode, LineClassifier, LineKind};

/// Parsing result with samples and statistics
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Samples in file order
    pub samples: Vec<Sample>,

    /// Line accounting for the file
    pub stats: ParseStats,
}

/// Line accounting for one parsed file
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ParseStats {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub boundaries: usize,
    pub metadata_pairs: usize,
    pub curve_rows: usize,
    /// Metadata values and curve cells that carried the missing-value token
    pub missing_values: usize,
    /// Lines outside any sample, unrecognized, or curve rows of the wrong width
    pub skipped_lines: usize,
    /// Boundaries were found with the loose `Sample <digits>` pattern
    pub used_fallback_boundaries: bool,
}

/// Parser position within the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    AwaitingSample,
    InMetadata,
    InCurveData { width: usize },
}

/// Sample under construction
#[derive(Debug)]
struct OpenSample {
    metadata: Metadata,
    curve: Option<CurveTable>,
}

/// Tracer export parser
#[derive(Debug, Clone, Default)]
pub struct SampleParser {
    config: ParserConfig,
}

impl SampleParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read and parse a tracer export from disk
    pub fn parse_file(&self, path: &Path) -> Result<ParseResult> {
        if !path.exists() {
            return Err(TracerError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let result = self.parse_str(&content, &source_file);
        info!(
            "Parsed {} samples from {} ({} lines)",
            result.samples.len(),
            path.display(),
            result.stats.total_lines
        );
        Ok(result)
    }

    /// Parse tracer export text
    pub fn parse_str(&self, content: &str, source_file: &str) -> ParseResult {
        let lines: Vec<&str> = content.lines().collect();
        let missing = self.config.missing_value_token.as_str();

        let (kinds, mode) = self.classify_lines(&lines, missing);
        let classifier = LineClassifier::new(mode, missing);

        let mut stats = ParseStats {
            total_lines: lines.len(),
            used_fallback_boundaries: mode == BoundaryMode::Fallback,
            ..ParseStats::default()
        };
        let mut samples = Vec::new();
        let mut state = ParseState::AwaitingSample;
        let mut open: Option<OpenSample> = None;

        for (line_no, kind) in kinds.into_iter().enumerate() {
            // Inside a table, a line of the header's width is a row whatever its first cell
            let kind = match (kind, state) {
                (pair @ LineKind::MetadataPair { .. }, ParseState::InCurveData { width }) => {
                    let cells = classifier.row_cells(lines[line_no]);
                    if fit_row(&cells, width).is_some() {
                        LineKind::CurveRow { cells }
                    } else {
                        pair
                    }
                }
                (kind, _) => kind,
            };

            match kind {
                LineKind::Blank => stats.blank_lines += 1,

                LineKind::Boundary { sample_no } => {
                    if let Some(sample) = open.take() {
                        samples.push(close_sample(sample, source_file));
                    }
                    stats.boundaries += 1;
                    if sample_no.is_none() {
                        stats.missing_values += 1;
                    }
                    let mut metadata = Metadata::new();
                    metadata.insert(metadata_keys::SAMPLE_NO, sample_no);
                    open = Some(OpenSample {
                        metadata,
                        curve: None,
                    });
                    state = ParseState::InMetadata;
                }

                LineKind::MetadataPair { key, value } => match open.as_mut() {
                    Some(sample) => {
                        if value.is_none() {
                            stats.missing_values += 1;
                        }
                        sample.metadata.insert(key, value);
                        stats.metadata_pairs += 1;
                    }
                    None => stats.skipped_lines += 1,
                },

                LineKind::CurveHeader { columns } => match open.as_mut() {
                    Some(sample) => {
                        let width = match &sample.curve {
                            Some(existing) => {
                                debug!(
                                    "Line {}: repeated curve header in sample {:?}",
                                    line_no + 1,
                                    sample.metadata.get(metadata_keys::SAMPLE_NO)
                                );
                                stats.skipped_lines += 1;
                                existing.columns.len()
                            }
                            None => {
                                let width = columns.len();
                                sample.curve = Some(CurveTable::new(columns));
                                width
                            }
                        };
                        state = ParseState::InCurveData { width };
                    }
                    None => stats.skipped_lines += 1,
                },

                LineKind::CurveRow { cells } => {
                    let curve = open.as_mut().and_then(|s| s.curve.as_mut());
                    match (state, curve) {
                        (ParseState::InCurveData { width }, Some(curve)) => {
                            match fit_row(&cells, width) {
                                Some(row) => {
                                    stats.missing_values += row
                                        .iter()
                                        .filter(|cell| **cell == CellValue::Missing)
                                        .count();
                                    curve.rows.push(row.to_vec());
                                    stats.curve_rows += 1;
                                }
                                None => {
                                    debug!(
                                        "Line {}: {} cells under a {}-column header",
                                        line_no + 1,
                                        cells.len(),
                                        width
                                    );
                                    stats.skipped_lines += 1;
                                }
                            }
                        }
                        _ => {
                            debug!("Line {}: curve row outside a curve table", line_no + 1);
                            stats.skipped_lines += 1;
                        }
                    }
                }

                LineKind::Unrecognized => {
                    debug!("Line {}: unrecognized", line_no + 1);
                    stats.skipped_lines += 1;
                }
            }
        }

        if let Some(sample) = open.take() {
            samples.push(close_sample(sample, source_file));
        }

        if samples.is_empty() {
            warn!(
                "No samples found in {}: no 'Sample No.' boundary lines",
                source_file
            );
        } else if stats.skipped_lines > 0 {
            warn!(
                "{}: lines skipped: {} (outside a sample, unrecognized, repeated headers or rows not matching the header width)",
                source_file, stats.skipped_lines
            );
        }

        ParseResult { samples, stats }
    }

    /// Classify every line, falling back to the loose boundary pattern when
    /// the primary one matches nowhere in the file
    fn classify_lines(&self, lines: &[&str], missing: &str) -> (Vec<LineKind>, BoundaryMode) {
        let classify_all = |mode: BoundaryMode| -> Vec<LineKind> {
            let classifier = LineClassifier::new(mode, missing);
            lines.iter().map(|line| classifier.classify(line)).collect()
        };

        let kinds = classify_all(BoundaryMode::Primary);
        let has_boundary = kinds
            .iter()
            .any(|kind| matches!(kind, LineKind::Boundary { .. }));

        if has_boundary || !self.config.allow_fallback_boundaries {
            return (kinds, BoundaryMode::Primary);
        }

        let fallback = classify_all(BoundaryMode::Fallback);
        if fallback
            .iter()
            .any(|kind| matches!(kind, LineKind::Boundary { .. }))
        {
            debug!("No 'Sample No.' boundaries; using loose 'Sample <n>' pattern");
            (fallback, BoundaryMode::Fallback)
        } else {
            (kinds, BoundaryMode::Primary)
        }
    }
}

/// The row cut to `width` cells, when it has that many plus only empty trailing cells
fn fit_row(cells: &[CellValue], width: usize) -> Option<&[CellValue]> {
    if cells.len() < width || cells[width..].iter().any(|c| *c != CellValue::Empty) {
        None
    } else {
        Some(&cells[..width])
    }
}

fn close_sample(sample: OpenSample, source_file: &str) -> Sample {
    Sample {
        metadata: sample.metadata,
        curve: sample.curve,
        source_file: source_file.to_string(),
    }
}

/// Parse tracer export text with the default configuration
pub fn parse_samples(content: &str, source_file: &str) -> Vec<Sample> {
    SampleParser::default()
        .parse_str(content, source_file)
        .samples
}
