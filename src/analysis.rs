//! Calibration error analysis.
//!
//! Compares an uncalibrated tracer trace (the comparand) against a calibrated
//! one (the reference). The reference is cleaned, the comparand is
//! interpolated onto the reference voltages, and the difference is scored
//! separately in the short-circuit, maximum-power and open-circuit regions.

pub mod aligner;
pub mod cleaning;
pub mod interpolation;
pub mod regions;

#[cfg(test)]
mod tests;

pub use aligner::{AlignedCurves, CurveAligner};
pub use cleaning::CleaningReport;
pub use interpolation::CubicSpline;
pub use regions::{RegionBounds, RegionalErrorAnalyzer, classify_region};

use tracing::info;

use crate::config::AnalysisConfig;
use crate::dataset::CalibrationDataset;
use crate::error::{Result, TracerError};
use crate::models::{CurveSeries, ErrorProfile, OperatingPoints};
use crate::parameters::reduce_curve;

/// Result of a full calibration comparison
#[derive(Debug, Clone)]
pub struct CalibrationReport {
    pub aligned: AlignedCurves,

    /// Operating points of the cleaned reference
    pub reference_points: OperatingPoints,

    /// Operating points of the comparand in amperes
    pub comparand_points: OperatingPoints,

    /// Region boundaries placed by the reference
    pub bounds: RegionBounds,

    pub profile: ErrorProfile,
}

/// Align, locate the reference operating points and score the error
pub fn analyze_calibration(
    reference: &CurveSeries,
    comparand: &CurveSeries,
    config: &AnalysisConfig,
) -> Result<CalibrationReport> {
    config.validate()?;

    let aligned = CurveAligner::new(config.clone()).align(reference, comparand)?;

    let reference_points = reduce_curve(&aligned.reference.points());
    let comparand_points = reduce_curve(&aligned.comparand.points());

    let bounds = RegionBounds::from_reference(&aligned.reference).ok_or_else(|| {
        TracerError::empty_series("reference", "no finite points to locate Voc, Vmax and Isc")
    })?;

    let profile = RegionalErrorAnalyzer::new(config.regions.clone()).analyze(
        &aligned.reference,
        &aligned.interpolated_current,
        &bounds,
    )?;

    info!(
        "Reference Voc {:.3}V, Vmax {:.3}V, Isc {:.4}A; {} points scored",
        bounds.voc,
        bounds.vmax,
        bounds.isc,
        profile.points.len()
    );

    Ok(CalibrationReport {
        aligned,
        reference_points,
        comparand_points,
        bounds,
        profile,
    })
}

/// [`analyze_calibration`] over a loaded dataset
pub fn analyze_dataset(
    dataset: &CalibrationDataset,
    config: &AnalysisConfig,
) -> Result<CalibrationReport> {
    analyze_calibration(&dataset.reference, &dataset.comparand, config)
}
