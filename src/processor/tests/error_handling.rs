//! Error handling tests for batch processing

use super::*;
use crate::error::TracerError;
use crate::processor::BatchProcessor;
use tempfile::TempDir;

#[test]
fn test_failed_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_tracer_file(temp_dir.path(), "good.csv", &[Some(4.0)]);
    let missing = temp_dir.path().join("missing.csv");

    let outcome = BatchProcessor::new(temp_dir.path().join("out"))
        .process_files(&[missing.clone(), good])
        .unwrap();

    assert_eq!(outcome.stats.files_failed, 1);
    assert_eq!(outcome.stats.files_processed, 1);
    assert_eq!(outcome.stats.failures[0].0, missing);
    assert_eq!(outcome.records.len(), 1);
}

#[test]
fn test_file_without_samples_is_counted() {
    let temp_dir = TempDir::new().unwrap();
    let empty = temp_dir.path().join("notes.csv");
    fs::write(&empty, "just,some\nother,text\n").unwrap();

    let output_dir = temp_dir.path().join("out");
    let outcome = BatchProcessor::new(output_dir.clone())
        .process_files(&[empty])
        .unwrap();

    assert_eq!(outcome.stats.files_without_samples, 1);
    assert!(outcome.records.is_empty());
    assert!(outcome.stats.output_files.is_empty());
    assert!(!output_dir.exists());
}

#[test]
fn test_skipped_lines_are_counted_per_batch() {
    let temp_dir = TempDir::new().unwrap();
    let clean = write_tracer_file(temp_dir.path(), "clean.csv", &[Some(4.0)]);
    let noisy = temp_dir.path().join("noisy.csv");
    fs::write(
        &noisy,
        "\"Sample No.\",\"1\"\n\"V (V)\",\"I (A)\",\"P (W)\"\n0.0,1.0,0.0\n0.5,1.0\nstray text\n",
    )
    .unwrap();

    let outcome = BatchProcessor::new(temp_dir.path().join("out"))
        .process_files(&[clean, noisy])
        .unwrap();

    assert_eq!(outcome.stats.samples_found, 2);
    assert_eq!(outcome.stats.lines_skipped, 2);
}

#[test]
fn test_no_inputs_matched() {
    let temp_dir = TempDir::new().unwrap();
    let result = BatchProcessor::new(temp_dir.path().join("out"))
        .process(&[temp_dir.path().join("*.csv")]);

    assert!(matches!(result, Err(TracerError::NoInputFiles { .. })));
}
