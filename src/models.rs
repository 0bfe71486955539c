//! Core data structures and types for IV curve processing.
//!
//! Defines parsed samples and their curve tables, derived parameter
//! records, curve series for calibration comparison, error profiles and
//! batch processing statistics.

use crate::constants::{CURRENT_COLUMN, POWER_COLUMN, VOLTAGE_COLUMN, metadata_keys};
use crate::error::{Result, TracerError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ordered key/value metadata of one sample.
///
/// Values are optional: the tracer's missing-value token is stored as `None`.
/// Insertion order is kept so a sample can be written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<(String, Option<String>)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing an earlier value for the same key in place
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Present, non-missing value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// First present value among several spellings of a key
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Whether the key was seen, regardless of its value
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// One cell of a curve table after best-effort numeric coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    /// Carried the missing-value token
    Missing,
    /// Nothing between the delimiters
    Empty,
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// One `(voltage, current, power)` triple of a measured curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

/// Tabular curve data of a sample as found in the file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl CurveTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Index of the first column matching any of the names (case-insensitive)
    pub fn column_index(&self, names: &[&str]) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| names.iter().any(|name| column.eq_ignore_ascii_case(name)))
    }

    /// Numeric curve triples in row order.
    ///
    /// Power comes from the power column when it holds a number, otherwise it
    /// is derived as `voltage * current`. Rows without a numeric voltage and
    /// current are left out.
    pub fn points(&self) -> Vec<CurvePoint> {
        let voltage_idx = self.column_index(&[VOLTAGE_COLUMN, "V"]).unwrap_or(0);
        let current_idx = self.column_index(&[CURRENT_COLUMN, "I"]).unwrap_or(1);
        let power_idx = self.column_index(&[POWER_COLUMN, "P"]);

        self.rows
            .iter()
            .filter_map(|row| {
                let voltage = row.get(voltage_idx)?.as_number()?;
                let current = row.get(current_idx)?.as_number()?;
                let power = power_idx
                    .and_then(|idx| row.get(idx))
                    .and_then(CellValue::as_number)
                    .unwrap_or(voltage * current);
                Some(CurvePoint {
                    voltage,
                    current,
                    power,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One tracer measurement event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub metadata: Metadata,
    pub curve: Option<CurveTable>,
    pub source_file: String,
}

impl Sample {
    pub fn sample_no(&self) -> Option<&str> {
        self.metadata.get(metadata_keys::SAMPLE_NO)
    }

    pub fn date_time(&self) -> Option<&str> {
        self.metadata.get(metadata_keys::DATE_TIME)
    }

    /// Numeric curve triples, empty when the sample carries no curve
    pub fn points(&self) -> Vec<CurvePoint> {
        self.curve
            .as_ref()
            .map(CurveTable::points)
            .unwrap_or_default()
    }
}

/// Derived performance parameters of one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub source_file: String,
    pub sample_id: Option<String>,
    pub date_time: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub voc: Option<f64>,
    pub isc: Option<f64>,
    pub pmax: Option<f64>,
    pub vmax: Option<f64>,
    pub imax: Option<f64>,
    pub fill_factor: Option<f64>,
}

/// Characteristic operating points of a curve
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OperatingPoints {
    pub voc: Option<f64>,
    pub isc: Option<f64>,
    pub pmax: Option<f64>,
    pub vmax: Option<f64>,
    pub imax: Option<f64>,
}

/// Paired voltage/current measurements in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveSeries {
    voltage: Vec<f64>,
    current: Vec<f64>,
}

impl CurveSeries {
    /// Create a series, rejecting unequal lengths
    pub fn new(voltage: Vec<f64>, current: Vec<f64>) -> Result<Self> {
        if voltage.len() != current.len() {
            return Err(TracerError::LengthMismatch {
                voltage: voltage.len(),
                current: current.len(),
            });
        }
        Ok(Self { voltage, current })
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let (voltage, current) = pairs.iter().copied().unzip();
        Self { voltage, current }
    }

    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    pub fn current(&self) -> &[f64] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }

    /// Curve triples with power derived as `voltage * current`
    pub fn points(&self) -> Vec<CurvePoint> {
        self.voltage
            .iter()
            .zip(&self.current)
            .map(|(&voltage, &current)| CurvePoint {
                voltage,
                current,
                power: voltage * current,
            })
            .collect()
    }

    /// Copy with every current multiplied by `factor`
    pub fn scale_current(&self, factor: f64) -> Self {
        Self {
            voltage: self.voltage.clone(),
            current: self.current.iter().map(|c| c * factor).collect(),
        }
    }

    /// Keep the first `len` points
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.min(self.len());
        Self {
            voltage: self.voltage[..len].to_vec(),
            current: self.current[..len].to_vec(),
        }
    }

    /// Keep the points for which `keep(voltage, current)` holds
    pub fn filtered(&self, mut keep: impl FnMut(f64, f64) -> bool) -> Self {
        let (voltage, current) = self
            .voltage
            .iter()
            .zip(&self.current)
            .filter(|&(&v, &c)| keep(v, c))
            .map(|(&v, &c)| (v, c))
            .unzip();
        Self { voltage, current }
    }
}

/// Operating region of the characteristic curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Isc,
    Mpp,
    Voc,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::Isc => "ISC",
            Region::Mpp => "MPP",
            Region::Voc => "VOC",
        }
    }
}

/// Error of one reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPoint {
    pub voltage: f64,
    pub reference_current: f64,
    pub comparand_current: f64,
    pub absolute_error: f64,
    /// `None` when the voltage falls in no region
    pub region: Option<Region>,
    /// Region-specific error; `None` when unclassified or undefined
    pub region_error: Option<f64>,
    /// Weighted contribution; `Some(0.0)` when unclassified, `None` when undefined
    pub weighted_error: Option<f64>,
}

/// Mean and max of a set of error values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStat {
    pub mean: f64,
    pub max: f64,
    pub count: usize,
}

impl ErrorStat {
    /// Statistics over the finite values, `None` when there are none
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sum = 0.0;
        let mut max = f64::NEG_INFINITY;
        let mut count = 0usize;
        for value in values.into_iter().filter(|v| v.is_finite()) {
            sum += value;
            max = max.max(value);
            count += 1;
        }
        (count > 0).then(|| Self {
            mean: sum / count as f64,
            max,
            count,
        })
    }
}

/// Summary statistics of an error profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub absolute: Option<ErrorStat>,
    pub mpp: Option<ErrorStat>,
    pub isc: Option<ErrorStat>,
    pub voc: Option<ErrorStat>,
    pub combined: Option<ErrorStat>,
    /// Points whose region error was undefined and left out of the statistics
    pub excluded_points: usize,
}

impl ErrorSummary {
    /// Named rows in report order
    pub fn rows(&self) -> Vec<(&'static str, Option<ErrorStat>)> {
        vec![
            ("Absolute", self.absolute),
            ("MPP", self.mpp),
            ("ISC", self.isc),
            ("VOC", self.voc),
            ("Combined", self.combined),
        ]
    }
}

/// Per-point errors on the reference voltage grid plus their summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorProfile {
    pub points: Vec<ErrorPoint>,
    pub summary: ErrorSummary,
}

impl ErrorProfile {
    /// Points tagged with the given region
    pub fn region_points(&self, region: Region) -> impl Iterator<Item = &ErrorPoint> {
        self.points.iter().filter(move |p| p.region == Some(region))
    }
}

/// Statistics of a multi-file batch run
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_without_samples: usize,
    pub samples_found: usize,
    pub vopen_rows: usize,
    pub vmax_rows: usize,
    pub imax_rows: usize,
    pub pmax_rows: usize,
    /// Lines the parser could not place, summed over files with samples
    pub lines_skipped: usize,
    pub failures: Vec<(PathBuf, String)>,
    pub output_files: Vec<PathBuf>,
    pub processing_time_ms: u128,
}
