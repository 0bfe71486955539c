//! IV Curve Processor Library
//!
//! A Rust library for working with the multi-sample CSV exports of a solar
//! IV-curve tracer.
//!
//! This library provides tools for:
//! - Parsing tracer exports into samples of metadata and curve points
//! - Deriving Voc, Isc, Pmax, Vmax, Imax and fill factor per sample
//! - Scoring an uncalibrated trace against a calibrated one by curve region
//! - Splitting exports into selected sample groups
//! - Cleaning and combining temperature logger exports
//! - Batch processing with per-file error recovery

pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod logger;
pub mod models;
pub mod parameters;
pub mod parser;
pub mod processor;
pub mod selection;

// Re-export commonly used types
pub use analysis::{CalibrationReport, CurveAligner, RegionalErrorAnalyzer, analyze_calibration};
pub use config::{AnalysisConfig, CurrentUnit, InterpolationMode, TracerConfig};
pub use dataset::CalibrationDataset;
pub use error::{Result, TracerError};
pub use models::{CurvePoint, CurveSeries, ErrorProfile, ParameterRecord, Sample};
pub use parameters::extract_parameters;
pub use parser::{SampleParser, parse_samples};
pub use processor::BatchProcessor;
