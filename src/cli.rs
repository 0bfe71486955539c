//! Command-line interface components.

pub mod commands;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{CurrentUnit, InterpolationMode};

#[derive(Parser, Debug)]
#[command(name = "ivcurve")]
#[command(about = "Extract PV parameters from IV-curve tracer exports and score calibration error")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract Voc, Isc, Pmax, Vmax and Imax from tracer exports
    Summarize(SummarizeArgs),
    /// Score an uncalibrated trace against a calibrated one by curve region
    Analyze(AnalyzeArgs),
    /// Split a tracer export into modified and unmodified sample files
    Split(SplitArgs),
    /// Clean and combine temperature logger exports
    Logger(LoggerArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SummarizeArgs {
    /// Tracer export files, directories or glob patterns
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the parameter tables
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct AnalyzeArgs {
    /// CSV with Voltage_Calib, Current_Calib, Voltage_Uncalib and Current_Uncalib
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Unit of the calibrated current column
    #[arg(long, value_enum, default_value_t = UnitArg::Amperes)]
    pub reference_units: UnitArg,

    /// Unit of the uncalibrated current column
    #[arg(long, value_enum, default_value_t = UnitArg::Amperes)]
    pub comparand_units: UnitArg,

    /// Handling of reference voltages outside the uncalibrated range
    #[arg(long, value_enum, default_value_t = InterpolationArg::Clamped)]
    pub interpolation: InterpolationArg,

    /// Write the error summary table to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the per-point error profile to this CSV file
    #[arg(long)]
    pub points: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct SplitArgs {
    /// Tracer export to split
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Samples for the modified file, e.g. "1,3,5-10"
    #[arg(long, value_name = "SEL")]
    pub modified: String,

    /// Samples for the unmodified file
    #[arg(long, value_name = "SEL")]
    pub unmodified: String,

    /// Accept samples selected for both files (they are written as modified)
    #[arg(long)]
    pub allow_overlap: bool,
}

#[derive(ClapArgs, Debug)]
pub struct LoggerArgs {
    /// Logger CSV files, directories or glob patterns
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Readings below this are masked (°C)
    #[arg(long, default_value_t = 30.0)]
    pub lower: f64,

    /// Readings above this are masked (°C)
    #[arg(long, default_value_t = 85.0)]
    pub upper: f64,

    /// Combined output CSV
    #[arg(short, long, default_value = "combined_temperatures.csv")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    Amperes,
    Milliamperes,
}

impl From<UnitArg> for CurrentUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Amperes => CurrentUnit::Amperes,
            UnitArg::Milliamperes => CurrentUnit::Milliamperes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterpolationArg {
    Clamped,
    Extrapolate,
}

impl From<InterpolationArg> for InterpolationMode {
    fn from(mode: InterpolationArg) -> Self {
        match mode {
            InterpolationArg::Clamped => InterpolationMode::Clamped,
            InterpolationArg::Extrapolate => InterpolationMode::Extrapolate,
        }
    }
}

impl Args {
    /// Log level implied by the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are shown unless quiet
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
