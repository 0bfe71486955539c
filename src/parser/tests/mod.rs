//! Test utilities for tracer export parsing
//!
//! Fixture builders shared by the parser test modules.

use std::io::Write;
use tempfile::NamedTempFile;

mod sample_tests;

/// A sample block in the tracer's comma layout
pub fn sample_block(sample_no: u32, metadata: &[(&str, &str)], rows: &[(f64, f64)]) -> String {
    let mut block = format!("\"Sample No.\",\"{}\"\n", sample_no);
    for (key, value) in metadata {
        block.push_str(&format!("\"{}\",\"{}\"\n", key, value));
    }
    if !rows.is_empty() {
        block.push_str("\"V (V)\",\"I (A)\",\"P (W)\"\n");
        for (v, i) in rows {
            block.push_str(&format!("{},{},{}\n", v, i, v * i));
        }
    }
    block
}

/// The same block with tabs between fields
pub fn tab_sample_block(sample_no: u32, metadata: &[(&str, &str)]) -> String {
    let mut block = format!("\"Sample No.\"\t\"{}\"\n", sample_no);
    for (key, value) in metadata {
        block.push_str(&format!("\"{}\"\t\"{}\"\n", key, value));
    }
    block
}

/// Write content to a temporary file
pub fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
