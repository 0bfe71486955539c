//! Calibration dataset loading.
//!
//! A calibration dataset holds the calibrated (reference) and uncalibrated
//! (comparand) traces side by side in four columns. The two traces are
//! usually of different lengths, so each pair is cleaned of missing values
//! on its own.

use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

use crate::constants::calibration_columns::{
    CURRENT_CALIB, CURRENT_UNCALIB, VOLTAGE_CALIB, VOLTAGE_UNCALIB,
};
use crate::error::{Result, TracerError};
use crate::models::CurveSeries;

/// Reference and comparand traces of one calibration run
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationDataset {
    /// Calibrated tracer trace
    pub reference: CurveSeries,

    /// Uncalibrated tracer trace
    pub comparand: CurveSeries,

    /// Rows dropped from the reference pair for a missing or non-numeric value
    pub reference_dropped: usize,

    /// Rows dropped from the comparand pair
    pub comparand_dropped: usize,
}

impl CalibrationDataset {
    /// Read a dataset CSV with a header row
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TracerError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let dataset = Self::from_frame(&df, path)?;
        info!(
            "Loaded calibration dataset {}: {} reference points, {} comparand points",
            path.display(),
            dataset.reference.len(),
            dataset.comparand.len()
        );
        Ok(dataset)
    }

    /// Build from a frame holding the four calibration columns.
    ///
    /// `source` names the frame's origin in errors.
    pub fn from_frame(df: &DataFrame, source: &Path) -> Result<Self> {
        let (reference, reference_dropped) = series_pair(df, source, VOLTAGE_CALIB, CURRENT_CALIB)?;
        let (comparand, comparand_dropped) =
            series_pair(df, source, VOLTAGE_UNCALIB, CURRENT_UNCALIB)?;

        for (name, dropped) in [
            ("reference", reference_dropped),
            ("comparand", comparand_dropped),
        ] {
            if dropped > 0 {
                warn!("{} series: rows removed: {}", name, dropped);
            }
        }

        Ok(Self {
            reference,
            comparand,
            reference_dropped,
            comparand_dropped,
        })
    }
}

/// Voltage/current pair with rows lacking a finite value in either column
/// removed, plus the number of removed rows
fn series_pair(
    df: &DataFrame,
    source: &Path,
    voltage_column: &str,
    current_column: &str,
) -> Result<(CurveSeries, usize)> {
    let voltage = numeric_column(df, source, voltage_column)?;
    let current = numeric_column(df, source, current_column)?;

    let pairs: Vec<(f64, f64)> = voltage
        .iter()
        .zip(&current)
        .filter_map(|(v, c)| match (v, c) {
            (Some(v), Some(c)) if v.is_finite() && c.is_finite() => Some((*v, *c)),
            _ => None,
        })
        .collect();

    let dropped = voltage.len() - pairs.len();
    Ok((CurveSeries::from_pairs(&pairs), dropped))
}

/// Column cast to `Float64`; text that is not a number becomes null
fn numeric_column(df: &DataFrame, source: &Path, name: &str) -> Result<Vec<Option<f64>>> {
    if df.get_column_index(name).is_none() {
        return Err(TracerError::MissingColumn {
            path: source.to_path_buf(),
            column: name.to_string(),
        });
    }

    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}
