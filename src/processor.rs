//! Batch processing of tracer exports.
//!
//! Runs the parser and parameter extraction over many files one after the
//! other, collects the records into the combined parameter tables and
//! writes them as CSV. A file that cannot be read is recorded and skipped;
//! the batch carries on with the rest.

pub mod discovery;
pub mod writer;

#[cfg(test)]
mod tests;

use self::discovery::discover_inputs;
use self::writer::CsvTableWriter;

use crate::config::TracerConfig;
use crate::constants::PARAMETERS_FILE;
use crate::error::Result;
use crate::models::{ParameterRecord, ProcessingStats};
use crate::parameters::{Parameter, extract_all, parameter_frame, parameters_frame};
use crate::parser::SampleParser;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Records and statistics of a batch run
#[derive(Debug)]
pub struct BatchOutcome {
    pub records: Vec<ParameterRecord>,
    pub stats: ProcessingStats,
}

/// Sequential multi-file parameter extraction
#[derive(Debug)]
pub struct BatchProcessor {
    config: TracerConfig,
    writer: CsvTableWriter,
    show_progress: bool,
}

impl BatchProcessor {
    /// Create a processor writing its tables into `output_dir`
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            config: TracerConfig::default(),
            writer: CsvTableWriter::new(output_dir),
            show_progress: false,
        }
    }

    /// Configure the processor
    pub fn with_config(mut self, config: TracerConfig) -> Self {
        self.config = config;
        self
    }

    /// Show a progress bar while files are processed
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Resolve inputs (files, directories or glob patterns) and process them
    pub fn process(&self, inputs: &[PathBuf]) -> Result<BatchOutcome> {
        let files = discover_inputs(inputs)?;
        info!("Discovered {} tracer files", files.len());
        self.process_files(&files)
    }

    /// Process the given files in order and write the output tables
    pub fn process_files(&self, files: &[PathBuf]) -> Result<BatchOutcome> {
        let start_time = Instant::now();
        let parser = SampleParser::new(self.config.parser.clone());
        let mut stats = ProcessingStats::default();
        let mut records = Vec::new();

        let pb = self.create_progress_bar(files.len() as u64);

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            pb.set_message(name.clone());

            match parser.parse_file(path) {
                Ok(result) => {
                    stats.files_processed += 1;
                    if result.samples.is_empty() {
                        stats.files_without_samples += 1;
                        warn!("No samples found in {}", path.display());
                    } else {
                        debug!("{}: {} samples", name, result.samples.len());
                        stats.lines_skipped += result.stats.skipped_lines;
                    }
                    stats.samples_found += result.samples.len();
                    records.extend(extract_all(&result.samples));
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    stats.files_failed += 1;
                    stats.failures.push((path.clone(), e.to_string()));
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.write_tables(&records, &mut stats)?;
        stats.processing_time_ms = start_time.elapsed().as_millis();

        Ok(BatchOutcome { records, stats })
    }

    /// Write the combined table and each non-empty per-parameter table
    fn write_tables(&self, records: &[ParameterRecord], stats: &mut ProcessingStats) -> Result<()> {
        if records.is_empty() {
            warn!("No parameter records extracted; no tables written");
            return Ok(());
        }

        let mut all = parameters_frame(records)?;
        stats
            .output_files
            .push(self.writer.write(&mut all, PARAMETERS_FILE)?);

        for parameter in Parameter::ALL {
            let mut df = parameter_frame(records, parameter)?;
            let rows = df.height();
            match parameter {
                Parameter::Vopen => stats.vopen_rows = rows,
                Parameter::Vmax => stats.vmax_rows = rows,
                Parameter::Imax => stats.imax_rows = rows,
                Parameter::Pmax => stats.pmax_rows = rows,
            }
            if rows == 0 {
                debug!("No {} values; {} not written", parameter.column(), parameter.file_name());
                continue;
            }
            stats
                .output_files
                .push(self.writer.write(&mut df, parameter.file_name())?);
        }
        Ok(())
    }

    fn create_progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Print a colored summary of a batch run
pub fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_without_samples > 0 {
        println!(
            "  {} {}",
            "Files without samples:".bright_yellow(),
            stats.files_without_samples.to_string().bright_yellow()
        );
    }
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
        for (path, reason) in &stats.failures {
            println!("    {} {}", path.display().to_string().red(), reason);
        }
    }
    println!(
        "  {} {}",
        "Samples found:".bright_cyan(),
        stats.samples_found.to_string().bright_white().bold()
    );
    if stats.lines_skipped > 0 {
        println!(
            "  {} {}",
            "Lines skipped:".bright_yellow(),
            stats.lines_skipped.to_string().bright_yellow()
        );
    }
    for (label, rows) in [
        ("Vopen rows:", stats.vopen_rows),
        ("Vmax rows:", stats.vmax_rows),
        ("Imax rows:", stats.imax_rows),
        ("Pmax rows:", stats.pmax_rows),
    ] {
        println!("  {} {}", label.bright_cyan(), rows.to_string().bright_white());
    }
    for path in &stats.output_files {
        println!("  {} {}", "Wrote".bright_green(), path.display());
    }
}
