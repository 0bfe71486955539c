//! Tests for batch processing
//!
//! Builds small tracer export trees in temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

pub mod basic_processing;
pub mod error_handling;

/// Tracer export with one sample per entry of `pmax`; `None` writes the
/// missing-value token
pub fn write_tracer_file(dir: &Path, name: &str, pmax: &[Option<f64>]) -> PathBuf {
    let mut content = String::from("\u{feff}");
    for (i, value) in pmax.iter().enumerate() {
        let value = value.map_or("-------".to_string(), |v| v.to_string());
        content.push_str(&format!(
            "\"Sample No.\",\"{}\"\n\"Date & Time\",\"14-03-2025 12:{:02}\"\n\"Vopen (V)\",\"21.{}\"\n\"Pmax (W)\",\"{}\"\n\n",
            i + 1,
            i,
            i,
            value
        ));
    }
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
