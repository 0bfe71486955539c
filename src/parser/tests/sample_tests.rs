//! Tests for metadata and curve table extraction

use super::*;
use crate::models::CellValue;
use crate::parser::writer::write_samples;
use crate::parser::{SampleParser, parse_samples};

#[test]
fn test_metadata_in_file_order() {
    let content = sample_block(
        1,
        &[
            ("Date & Time", "14-03-2025 12:30:00"),
            ("Vopen (V)", "21.4"),
            ("Ishort (A)", "0.33"),
        ],
        &[],
    );

    let samples = parse_samples(&content, "order.csv");
    let keys: Vec<&str> = samples[0].metadata.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec!["Sample No.", "Date & Time", "Vopen (V)", "Ishort (A)"]
    );
    assert_eq!(samples[0].date_time(), Some("14-03-2025 12:30:00"));
}

#[test]
fn test_sentinel_values_are_absent() {
    let content = sample_block(
        1,
        &[("Vopen (V)", "-------"), ("Pmax (W)", "4.2")],
        &[],
    );
    let result = SampleParser::default().parse_str(&content, "sentinel.csv");
    let sample = &result.samples[0];

    assert_eq!(sample.metadata.get("Vopen (V)"), None);
    assert!(sample.metadata.contains_key("Vopen (V)"));
    assert_eq!(sample.metadata.get("Pmax (W)"), Some("4.2"));
    assert_eq!(result.stats.missing_values, 1);
}

#[test]
fn test_curve_table_rows_and_points() {
    let content = sample_block(
        1,
        &[("Vopen (V)", "0.6")],
        &[(0.0, 3.0), (0.3, 2.9), (0.6, 0.0)],
    );

    let result = SampleParser::default().parse_str(&content, "curve.csv");
    let curve = result.samples[0].curve.as_ref().unwrap();

    assert_eq!(curve.columns, vec!["V (V)", "I (A)", "P (W)"]);
    assert_eq!(curve.rows.len(), 3);
    assert_eq!(result.stats.curve_rows, 3);

    let points = result.samples[0].points();
    assert_eq!(points.len(), 3);
    assert!((points[1].power - 0.87).abs() < 1e-9);
}

#[test]
fn test_sample_without_curve_table() {
    let content = format!(
        "{}{}",
        sample_block(1, &[("Vopen (V)", "20.1")], &[]),
        sample_block(2, &[("Vopen (V)", "20.2")], &[(0.0, 1.0)])
    );

    let samples = parse_samples(&content, "mixed.csv");
    assert!(samples[0].curve.is_none());
    assert!(samples[0].points().is_empty());
    assert!(samples[1].curve.is_some());
}

#[test]
fn test_missing_curve_cells() {
    let content = "\"Sample No.\",\"1\"\n\"V (V)\",\"I (A)\"\n0.0,-------\n0.5,1.5\n";
    let result = SampleParser::default().parse_str(content, "cells.csv");
    let curve = result.samples[0].curve.as_ref().unwrap();

    assert_eq!(curve.rows[0], vec![CellValue::Number(0.0), CellValue::Missing]);
    assert_eq!(result.samples[0].points().len(), 1);
    assert_eq!(result.stats.missing_values, 1);
}

#[test]
fn test_rows_of_wrong_width_are_skipped() {
    let content = "\"Sample No.\",\"1\"\n\"V (V)\",\"I (A)\",\"P (W)\"\n0.0,1.0,0.0\n0.5,1.0\n1.0,0.5,0.5\n";
    let result = SampleParser::default().parse_str(content, "width.csv");

    assert_eq!(result.samples[0].curve.as_ref().unwrap().rows.len(), 2);
    assert_eq!(result.stats.skipped_lines, 1);
}

#[test]
fn test_header_substring_in_metadata_key_is_not_a_header() {
    let content = "\"Sample No.\",\"1\"\n\"Peak V (V) note\",\"ok\"\n";
    let samples = parse_samples(content, "substring.csv");

    assert!(samples[0].curve.is_none());
    assert_eq!(samples[0].metadata.get("Peak V (V) note"), Some("ok"));
}

#[test]
fn test_metadata_after_curve_belongs_to_same_sample() {
    let content = "\"Sample No.\",\"1\"\n\"V (V)\",\"I (A)\",\"P (W)\"\n0.0,1.0,0.0\n\"Irradiance\",\"980\"\n";
    let samples = parse_samples(content, "late.csv");

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].metadata.get("Irradiance"), Some("980"));
    assert_eq!(samples[0].curve.as_ref().unwrap().rows.len(), 1);
}

#[test]
fn test_two_column_rows_with_text_first_cell_stay_in_table() {
    let content = "\"Sample No.\",\"1\"\n\"V (V)\",\"I (A)\"\n-------,0.5\n0.5,0.8\nn/a,0.3\n";
    let result = SampleParser::default().parse_str(content, "narrow.csv");
    let sample = &result.samples[0];

    assert_eq!(
        sample.curve.as_ref().unwrap().rows,
        vec![
            vec![CellValue::Missing, CellValue::Number(0.5)],
            vec![CellValue::Number(0.5), CellValue::Number(0.8)],
            vec![CellValue::Text("n/a".to_string()), CellValue::Number(0.3)],
        ]
    );
    let keys: Vec<&str> = sample.metadata.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["Sample No."]);
    assert_eq!(result.stats.curve_rows, 3);
    assert_eq!(result.stats.metadata_pairs, 0);
    assert_eq!(result.stats.missing_values, 1);
}

#[test]
fn test_empty_metadata_value_and_curve_cell_are_kept() {
    let content = "\"Sample No.\",\"1\"\n\"Comment\",\"\"\n\"V (V)\",\"I (A)\",\"P (W)\"\n0.0,1.0,\n0.5,0.8,0.4\n";
    let result = SampleParser::default().parse_str(content, "empty.csv");
    let sample = &result.samples[0];

    assert!(sample.metadata.contains_key("Comment"));
    assert_eq!(sample.metadata.get("Comment"), Some(""));

    let curve = sample.curve.as_ref().unwrap();
    assert_eq!(curve.rows.len(), 2);
    assert_eq!(
        curve.rows[0],
        vec![CellValue::Number(0.0), CellValue::Number(1.0), CellValue::Empty]
    );
    assert_eq!(result.stats.skipped_lines, 0);

    // Power is derived when its cell is empty
    let points = sample.points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].power, 0.0);
}

#[test]
fn test_trailing_delimiters_do_not_change_width() {
    let content = "\"Sample No.\",\"1\",\n\"Vopen (V)\",\"21.5\",,\n\"V (V)\",\"I (A)\",\n0.0,2.0,\n0.5,1.5\n";
    let result = SampleParser::default().parse_str(content, "trailing.csv");
    let sample = &result.samples[0];

    assert_eq!(sample.metadata.get("Sample No."), Some("1"));
    assert_eq!(sample.metadata.get("Vopen (V)"), Some("21.5"));
    let curve = sample.curve.as_ref().unwrap();
    assert_eq!(curve.columns, vec!["V (V)", "I (A)"]);
    assert_eq!(curve.rows.len(), 2);
    assert_eq!(result.stats.skipped_lines, 0);
}

#[test]
fn test_repeated_header_keeps_first_table() {
    let content = "\"Sample No.\",\"1\"\n\"V (V)\",\"I (A)\"\n0.0,1.0\n\"V (V)\",\"I (A)\"\n0.5,0.8\n";
    let result = SampleParser::default().parse_str(content, "repeat.csv");

    assert_eq!(result.samples[0].curve.as_ref().unwrap().rows.len(), 2);
    assert_eq!(result.stats.skipped_lines, 1);
}

#[test]
fn test_written_samples_parse_back() {
    let content = format!(
        "{}\n{}",
        sample_block(
            1,
            &[("Date & Time", "01-02-2025 08:00"), ("Pmax (W)", "-------")],
            &[(0.0, 2.0), (0.5, 1.0)]
        ),
        sample_block(2, &[("Vopen (V)", "19.9"), ("Comment", "")], &[])
    );
    let samples = parse_samples(&content, "source.csv");

    let mut out = Vec::new();
    write_samples(&mut out, &samples, "-------").unwrap();
    let reparsed = parse_samples(&String::from_utf8(out).unwrap(), "source.csv");

    assert_eq!(reparsed, samples);
}
