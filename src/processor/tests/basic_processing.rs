//! Basic batch processing tests

use super::*;
use crate::constants::{IMAX_FILE, PARAMETERS_FILE, PMAX_FILE, VOPEN_FILE};
use crate::processor::BatchProcessor;
use tempfile::TempDir;

#[test]
fn test_combines_files_into_parameter_tables() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("input");
    fs::create_dir_all(&input_dir).unwrap();
    write_tracer_file(&input_dir, "morning.csv", &[Some(4.5), None]);
    write_tracer_file(&input_dir, "evening.csv", &[Some(3.9)]);

    let output_dir = temp_dir.path().join("out");
    let outcome = BatchProcessor::new(output_dir.clone())
        .process(&[input_dir])
        .unwrap();

    let stats = &outcome.stats;
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.samples_found, 3);
    assert_eq!(stats.vopen_rows, 3);
    assert_eq!(stats.pmax_rows, 2);
    assert_eq!(stats.imax_rows, 0);

    assert!(output_dir.join(PARAMETERS_FILE).exists());
    assert!(output_dir.join(VOPEN_FILE).exists());
    assert!(output_dir.join(PMAX_FILE).exists());
    assert!(!output_dir.join(IMAX_FILE).exists());

    let pmax = fs::read_to_string(output_dir.join(PMAX_FILE)).unwrap();
    assert!(pmax.starts_with("Source File,Sample No.,Date & Time,Pmax (W)"));
    assert_eq!(pmax.lines().count(), 3);
}

#[test]
fn test_records_keep_file_order() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_tracer_file(temp_dir.path(), "a.csv", &[Some(1.0)]);
    let b = write_tracer_file(temp_dir.path(), "b.csv", &[Some(2.0), Some(3.0)]);

    let outcome = BatchProcessor::new(temp_dir.path().join("out"))
        .process_files(&[b, a])
        .unwrap();

    let sources: Vec<&str> = outcome
        .records
        .iter()
        .map(|r| r.source_file.as_str())
        .collect();
    assert_eq!(sources, vec!["b.csv", "b.csv", "a.csv"]);
    assert_eq!(outcome.records[1].pmax, Some(3.0));
}
