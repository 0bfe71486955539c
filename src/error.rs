//! Error handling for IV curve processing operations.
//!
//! Provides error types with context for file parsing, calibration dataset
//! loading, curve alignment and sample selection failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("{series} series is empty: {reason}")]
    EmptySeries {
        series: &'static str,
        reason: String,
    },

    #[error("Curve series length mismatch: {voltage} voltage values, {current} current values")]
    LengthMismatch { voltage: usize, current: usize },

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid sample selection '{input}': {reason}")]
    InvalidSelection { input: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("No input files matched: {pattern}")]
    NoInputFiles { pattern: String },
}

impl TracerError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an empty series error for the named series
    pub fn empty_series(series: &'static str, reason: impl Into<String>) -> Self {
        Self::EmptySeries {
            series,
            reason: reason.into(),
        }
    }

    /// Create an invalid selection error
    pub fn invalid_selection(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TracerError>;
