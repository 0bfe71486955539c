//! CSV table writing
//!
//! Writes polars frames to CSV files, creating parent directories as
//! needed.

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, TracerError};

/// Writes output tables beneath one directory
#[derive(Debug, Clone)]
pub struct CsvTableWriter {
    output_dir: PathBuf,
}

impl CsvTableWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `df` as `<output_dir>/<file_name>` and return the path
    pub fn write(&self, df: &mut DataFrame, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        write_csv(df, &path)?;
        Ok(path)
    }
}

/// Write a frame with a header row
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| TracerError::ProcessingFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to write CSV: {}", e),
        })?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
