//! Alignment of a comparand curve onto the reference voltage grid

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cleaning::{CleaningReport, clean_reference};
use super::interpolation::CubicSpline;
use crate::config::{AnalysisConfig, InterpolationMode};
use crate::error::{Result, TracerError};
use crate::models::CurveSeries;

/// Output of [`CurveAligner::align`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedCurves {
    /// Reference series in amperes after cleaning
    pub reference: CurveSeries,

    /// Comparand series in amperes
    pub comparand: CurveSeries,

    /// Comparand current at each reference voltage
    pub interpolated_current: Vec<f64>,

    pub cleaning: CleaningReport,
    pub mode: InterpolationMode,
}

/// Interpolates a comparand series onto a reference series' voltages
#[derive(Debug, Clone, Default)]
pub struct CurveAligner {
    config: AnalysisConfig,
}

impl CurveAligner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Convert both series to amperes, clean the reference and sample the
    /// comparand's spline at every remaining reference voltage.
    ///
    /// Fails with [`TracerError::EmptySeries`] when either series has no
    /// usable points.
    pub fn align(&self, reference: &CurveSeries, comparand: &CurveSeries) -> Result<AlignedCurves> {
        if reference.is_empty() {
            return Err(TracerError::empty_series("reference", "no data points"));
        }
        if comparand.is_empty() {
            return Err(TracerError::empty_series("comparand", "no data points"));
        }

        let reference =
            reference.scale_current(self.config.reference_unit.to_amperes_factor());
        let comparand =
            comparand.scale_current(self.config.comparand_unit.to_amperes_factor());

        let (reference, cleaning) = clean_reference(&reference, &self.config.cleaning);
        if reference.is_empty() {
            return Err(TracerError::empty_series(
                "reference",
                format!("all {} points removed by cleaning", cleaning.original_len),
            ));
        }

        let spline = CubicSpline::fit(comparand.voltage(), comparand.current()).ok_or_else(|| {
            TracerError::empty_series("comparand", "no finite voltage/current pairs")
        })?;

        let mode = self.config.interpolation;
        let (low, high) = spline.domain();
        let outside = reference
            .voltage()
            .iter()
            .filter(|&&v| v < low || v > high)
            .count();
        if outside > 0 {
            debug!(
                "{} reference voltages outside comparand range [{:.3}, {:.3}] V ({:?})",
                outside, low, high, mode
            );
        }

        let interpolated_current = spline.evaluate_all(reference.voltage(), mode);

        info!(
            "Aligned {} reference points against {} comparand points ({} removed by cleaning)",
            reference.len(),
            comparand.len(),
            cleaning.removed_points()
        );

        Ok(AlignedCurves {
            reference,
            comparand,
            interpolated_current,
            cleaning,
            mode,
        })
    }
}
