//! Temperature logger processing.
//!
//! Logger exports carry a `Date:` and a `Time:` column followed by one
//! `Channel - N` column per thermocouple. Open channels read as text such as
//! `OPEN`; those and any reading outside the plausible band are masked to
//! null before the per-panel averages are taken. Several exports are
//! combined into one time-sorted table.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::LoggerConfig;
use crate::constants::OUTPUT_TIMESTAMP_FORMAT;
use crate::constants::logger_columns::{CHANNEL_PREFIX, DATE, TIME, TIMESTAMP};
use crate::error::{Result, TracerError};
use crate::parameters::parse_timestamp;

/// Cleaned readings of one or more logger exports
#[derive(Debug, Clone)]
pub struct LoggerTable {
    /// `Timestamp`, channel columns and one column per panel average
    pub frame: DataFrame,

    /// Rows dropped because their timestamp could not be parsed
    pub rows_dropped: usize,

    /// Readings masked because they were not numeric or out of band
    pub values_masked: usize,
}

/// Combined result over several logger exports
#[derive(Debug)]
pub struct LoggerOutcome {
    pub table: LoggerTable,
    pub files_read: usize,
    pub failures: Vec<(PathBuf, String)>,
}

/// Channel number of a `Channel - N` column
pub fn channel_number(column: &str) -> Option<u32> {
    column.strip_prefix(CHANNEL_PREFIX)?.trim().parse().ok()
}

/// Loads and cleans logger exports
#[derive(Debug, Clone, Default)]
pub struct LoggerProcessor {
    config: LoggerConfig,
}

impl LoggerProcessor {
    pub fn new(config: LoggerConfig) -> Self {
        Self { config }
    }

    /// Read and clean one logger CSV
    pub fn process_file(&self, path: &Path) -> Result<LoggerTable> {
        if !path.exists() {
            return Err(TracerError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let table = self.process_frame(&df, path)?;
        info!(
            "Logger file {}: {} rows kept, {} dropped, {} readings masked",
            path.display(),
            table.frame.height(),
            table.rows_dropped,
            table.values_masked
        );
        Ok(table)
    }

    /// Clean a raw logger frame; `source` names it in errors
    pub fn process_frame(&self, df: &DataFrame, source: &Path) -> Result<LoggerTable> {
        let dates = text_column(df, source, DATE)?;
        let times = text_column(df, source, TIME)?;

        let timestamps: Vec<Option<String>> = dates
            .iter()
            .zip(&times)
            .map(|(date, time)| {
                let (date, time) = (date.as_deref()?, time.as_deref()?);
                parse_timestamp(&format!("{} {}", date.trim(), time.trim()))
                    .map(|ts| ts.format(OUTPUT_TIMESTAMP_FORMAT).to_string())
            })
            .collect();
        let keep: Vec<bool> = timestamps.iter().map(Option::is_some).collect();
        let rows_dropped = keep.iter().filter(|k| !**k).count();
        if rows_dropped > 0 {
            warn!(
                "{}: rows removed: {} (unparseable timestamp)",
                source.display(),
                rows_dropped
            );
        }

        let mut columns = vec![Column::new(
            TIMESTAMP.into(),
            timestamps.into_iter().flatten().collect::<Vec<String>>(),
        )];

        let mut values_masked = 0;
        let mut channels: Vec<(u32, Vec<Option<f64>>)> = Vec::new();
        for name in df.get_column_names_str() {
            let Some(number) = channel_number(name) else {
                continue;
            };
            let raw = df
                .column(name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = raw
                .f64()?
                .into_iter()
                .zip(&keep)
                .filter(|(_, keep)| **keep)
                .map(|(value, _)| value)
                .collect();

            let present_raw = df
                .column(name)?
                .as_materialized_series()
                .is_not_null()
                .into_iter()
                .zip(&keep)
                .filter(|(present, keep)| **keep && present.unwrap_or(false))
                .count();

            let masked: Vec<Option<f64>> = values
                .into_iter()
                .map(|value| value.filter(|v| self.in_band(*v)))
                .collect();
            values_masked += present_raw - masked.iter().flatten().count();

            columns.push(Column::new(name.into(), masked.clone()));
            channels.push((number, masked));
        }

        if channels.is_empty() {
            warn!("{}: no '{}N' columns found", source.display(), CHANNEL_PREFIX);
        }

        for panel in &self.config.panels {
            let members: Vec<&Vec<Option<f64>>> = channels
                .iter()
                .filter(|(number, _)| panel.channels.contains(number))
                .map(|(_, values)| values)
                .collect();
            if members.is_empty() {
                debug!("{}: no channels present for {}", source.display(), panel.name);
            }
            let averages = row_means(&members, columns[0].len());
            columns.push(Column::new(panel.name.as_str().into(), averages));
        }

        Ok(LoggerTable {
            frame: DataFrame::new(columns)?,
            rows_dropped,
            values_masked,
        })
    }

    /// Process several exports, skipping those that fail, and combine the
    /// rest sorted by timestamp
    pub fn combine_files(&self, paths: &[PathBuf]) -> Result<LoggerOutcome> {
        if paths.is_empty() {
            return Err(TracerError::NoInputFiles {
                pattern: "logger inputs".to_string(),
            });
        }

        let mut tables = Vec::new();
        let mut failures = Vec::new();
        for path in paths {
            match self.process_file(path) {
                Ok(table) => tables.push(table),
                Err(e) => {
                    warn!("Skipping logger file {}: {}", path.display(), e);
                    failures.push((path.clone(), e.to_string()));
                }
            }
        }

        if tables.is_empty() {
            return Err(TracerError::ProcessingFailed {
                path: paths[0].clone(),
                reason: format!("none of the {} logger files could be processed", paths.len()),
            });
        }

        let files_read = tables.len();
        let table = combine_tables(tables)?;
        Ok(LoggerOutcome {
            table,
            files_read,
            failures,
        })
    }

    fn in_band(&self, value: f64) -> bool {
        value.is_finite() && value >= self.config.lower_threshold && value <= self.config.upper_threshold
    }
}

/// Stack tables with possibly different channel sets and sort by timestamp
pub fn combine_tables(tables: Vec<LoggerTable>) -> Result<LoggerTable> {
    let rows_dropped = tables.iter().map(|t| t.rows_dropped).sum();
    let values_masked = tables.iter().map(|t| t.values_masked).sum();
    let frames: Vec<LazyFrame> = tables.into_iter().map(|t| t.frame.lazy()).collect();

    let frame = concat_lf_diagonal(frames, UnionArgs::default())?
        .sort([TIMESTAMP], SortMultipleOptions::default())
        .collect()?;

    Ok(LoggerTable {
        frame,
        rows_dropped,
        values_masked,
    })
}

/// Column as optional strings, whatever type the reader inferred
fn text_column(df: &DataFrame, source: &Path, name: &str) -> Result<Vec<Option<String>>> {
    if df.get_column_index(name).is_none() {
        return Err(TracerError::MissingColumn {
            path: source.to_path_buf(),
            column: name.to_string(),
        });
    }

    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Mean of the present values in each row, null when none is present
fn row_means(columns: &[&Vec<Option<f64>>], rows: usize) -> Vec<Option<f64>> {
    (0..rows)
        .map(|row| {
            let present: Vec<f64> = columns
                .iter()
                .filter_map(|values| values.get(row).copied().flatten())
                .collect();
            (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelGroup;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn logger_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn two_panel_config() -> LoggerConfig {
        LoggerConfig {
            panels: vec![
                PanelGroup {
                    name: "Panel1_Avg".to_string(),
                    channels: vec![1, 2],
                },
                PanelGroup {
                    name: "Panel2_Avg".to_string(),
                    channels: vec![11],
                },
            ],
            ..LoggerConfig::default()
        }
    }

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_channel_number() {
        assert_eq!(channel_number("Channel - 12"), Some(12));
        assert_eq!(channel_number("Channel - x"), None);
        assert_eq!(channel_number("Date:"), None);
    }

    #[test]
    fn test_masking_and_panel_averages() {
        let file = logger_file(
            "Date:,Time:,Channel - 1,Channel - 2,Channel - 11\n\
             2025-03-14,12:00:00,40.0,50.0,OPEN\n\
             2025-03-14,12:00:10,20.0,60.0,45.0\n\
             2025-03-14,12:00:20,90.0,OPEN,85.0\n",
        );
        let table = LoggerProcessor::new(two_panel_config())
            .process_file(file.path())
            .unwrap();

        let df = &table.frame;
        assert_eq!(df.height(), 3);
        assert_eq!(
            f64_values(df, "Channel - 1"),
            vec![Some(40.0), None, None]
        );
        assert_eq!(
            f64_values(df, "Panel1_Avg"),
            vec![Some(45.0), Some(60.0), None]
        );
        assert_eq!(
            f64_values(df, "Panel2_Avg"),
            vec![None, Some(45.0), Some(85.0)]
        );
        // 20.0 and 90.0 out of band, plus two OPEN readings
        assert_eq!(table.values_masked, 4);
        assert_eq!(table.rows_dropped, 0);
    }

    #[test]
    fn test_unparseable_timestamps_dropped() {
        let df = df!(
            "Date:" => ["14-03-2025", "not a date"],
            "Time:" => ["08:00:00.500", "08:00:01"],
            "Channel - 1" => [50.0, 51.0],
        )
        .unwrap();
        let table = LoggerProcessor::default()
            .process_frame(&df, Path::new("frame"))
            .unwrap();

        assert_eq!(table.rows_dropped, 1);
        let stamps: Vec<Option<&str>> = table
            .frame
            .column("Timestamp")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(stamps, vec![Some("2025-03-14 08:00:00")]);
    }

    #[test]
    fn test_missing_time_column() {
        let df = df!("Date:" => ["2025-03-14"], "Channel - 1" => [50.0]).unwrap();
        let err = LoggerProcessor::default()
            .process_frame(&df, Path::new("frame"))
            .unwrap_err();
        assert!(matches!(err, TracerError::MissingColumn { .. }));
    }

    #[test]
    fn test_combine_sorts_and_skips_failures() {
        let later = logger_file("Date:,Time:,Channel - 1\n2025-03-14,13:00:00,50.0\n");
        let earlier =
            logger_file("Date:,Time:,Channel - 1,Channel - 2\n2025-03-14,09:00:00,40.0,41.0\n");
        let paths = vec![
            later.path().to_path_buf(),
            PathBuf::from("/no/such/logger.csv"),
            earlier.path().to_path_buf(),
        ];

        let outcome = LoggerProcessor::new(two_panel_config())
            .combine_files(&paths)
            .unwrap();

        assert_eq!(outcome.files_read, 2);
        assert_eq!(outcome.failures.len(), 1);
        let df = &outcome.table.frame;
        assert_eq!(df.height(), 2);
        assert_eq!(f64_values(df, "Channel - 1"), vec![Some(40.0), Some(50.0)]);
        assert_eq!(f64_values(df, "Channel - 2"), vec![Some(41.0), None]);
    }

    #[test]
    fn test_combine_fails_when_nothing_readable() {
        let err = LoggerProcessor::default()
            .combine_files(&[PathBuf::from("/no/such/logger.csv")])
            .unwrap_err();
        assert!(matches!(err, TracerError::ProcessingFailed { .. }));
    }
}
