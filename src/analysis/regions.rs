//! Region-weighted calibration error
//!
//! Splits the reference voltage axis into the short-circuit, maximum-power
//! and open-circuit regions and scores the comparand's error in each with a
//! metric suited to that region.

use polars::prelude::*;
use tracing::{debug, warn};

use crate::config::RegionConfig;
use crate::error::{Result, TracerError};
use crate::models::{
    CurveSeries, ErrorPoint, ErrorProfile, ErrorStat, ErrorSummary, OperatingPoints, Region,
};
use crate::parameters::reduce_curve;

/// Reference operating points that place the region boundaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub voc: f64,
    pub vmax: f64,
    pub isc: f64,
}

impl RegionBounds {
    /// `None` unless VOC, Vmax and ISC are all known
    pub fn from_operating_points(points: &OperatingPoints) -> Option<Self> {
        Some(Self {
            voc: points.voc?,
            vmax: points.vmax?,
            isc: points.isc?,
        })
    }

    /// Bounds of a cleaned reference trace.
    ///
    /// Voc is the voltage at the lowest current, first occurrence on ties,
    /// so a trace that runs past zero current places it at its far end.
    /// Vmax and Isc come from [`reduce_curve`].
    pub fn from_reference(reference: &CurveSeries) -> Option<Self> {
        let reduced = reduce_curve(&reference.points());
        let voc = reference
            .voltage()
            .iter()
            .zip(reference.current())
            .filter(|(v, i)| v.is_finite() && i.is_finite())
            .fold(None::<(f64, f64)>, |lowest, (&v, &i)| match lowest {
                Some((_, low)) if low <= i => lowest,
                _ => Some((v, i)),
            })
            .map(|(v, _)| v);

        Self::from_operating_points(&OperatingPoints { voc, ..reduced })
    }
}

/// Region of voltage `v`.
///
/// MPP is tested first, then ISC, then VOC. The MPP and VOC bounds are not
/// forced to meet: with Vmax close to Voc the MPP region is empty.
pub fn classify_region(v: f64, bounds: &RegionBounds, config: &RegionConfig) -> Option<Region> {
    let mpp_low = config.mpp_lower_vmax_fraction * bounds.vmax;
    let mpp_high = config.mpp_upper_voc_fraction * bounds.voc;

    if mpp_low < v && v < mpp_high {
        Some(Region::Mpp)
    } else if v < config.isc_upper_voc_fraction * bounds.voc {
        Some(Region::Isc)
    } else if v > config.voc_lower_voc_fraction * bounds.voc {
        Some(Region::Voc)
    } else {
        None
    }
}

/// Scores an aligned comparand against its reference by region
#[derive(Debug, Clone, Default)]
pub struct RegionalErrorAnalyzer {
    config: RegionConfig,
}

impl RegionalErrorAnalyzer {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }

    /// Build the error profile on the reference voltage grid
    pub fn analyze(
        &self,
        reference: &CurveSeries,
        comparand_current: &[f64],
        bounds: &RegionBounds,
    ) -> Result<ErrorProfile> {
        if reference.len() != comparand_current.len() {
            return Err(TracerError::LengthMismatch {
                voltage: reference.len(),
                current: comparand_current.len(),
            });
        }

        if self.config.mpp_lower_vmax_fraction * bounds.vmax
            >= self.config.mpp_upper_voc_fraction * bounds.voc
        {
            warn!(
                "MPP region is empty: {:.3}*Vmax ({:.3}V) is not below {:.3}*Voc ({:.3}V)",
                self.config.mpp_lower_vmax_fraction,
                bounds.vmax,
                self.config.mpp_upper_voc_fraction,
                bounds.voc
            );
        }

        let points: Vec<ErrorPoint> = reference
            .voltage()
            .iter()
            .zip(reference.current())
            .zip(comparand_current)
            .map(|((&voltage, &reference_current), &comparand_current)| {
                self.score(voltage, reference_current, comparand_current, bounds)
            })
            .collect();

        let summary = self.summarize(&points);
        if summary.excluded_points > 0 {
            warn!(
                "{} points with undefined error excluded from statistics",
                summary.excluded_points
            );
        }
        debug!(
            "Regions: {} MPP, {} ISC, {} VOC, {} unclassified",
            count(&points, Some(Region::Mpp)),
            count(&points, Some(Region::Isc)),
            count(&points, Some(Region::Voc)),
            count(&points, None)
        );

        Ok(ErrorProfile { points, summary })
    }

    fn score(
        &self,
        voltage: f64,
        reference_current: f64,
        comparand_current: f64,
        bounds: &RegionBounds,
    ) -> ErrorPoint {
        let absolute_error = (reference_current - comparand_current).abs();
        let region = classify_region(voltage, bounds, &self.config);

        let region_error = region
            .and_then(|region| match region {
                Region::Mpp => (reference_current != 0.0)
                    .then(|| absolute_error / reference_current * 100.0),
                Region::Isc => (bounds.isc != 0.0).then(|| absolute_error / bounds.isc * 100.0),
                Region::Voc => Some(absolute_error),
            })
            .filter(|e| e.is_finite());

        let weighted_error = match region {
            Some(region) => region_error.map(|e| e * self.weight(region)),
            None => Some(0.0),
        };

        ErrorPoint {
            voltage,
            reference_current,
            comparand_current,
            absolute_error,
            region,
            region_error,
            weighted_error,
        }
    }

    fn weight(&self, region: Region) -> f64 {
        match region {
            Region::Mpp => self.config.mpp_weight,
            Region::Isc => self.config.isc_weight,
            Region::Voc => self.config.voc_weight,
        }
    }

    fn summarize(&self, points: &[ErrorPoint]) -> ErrorSummary {
        let region_stat = |region: Region| {
            ErrorStat::from_values(
                points
                    .iter()
                    .filter(|p| p.region == Some(region))
                    .filter_map(|p| p.region_error),
            )
        };

        ErrorSummary {
            absolute: ErrorStat::from_values(points.iter().map(|p| p.absolute_error)),
            mpp: region_stat(Region::Mpp),
            isc: region_stat(Region::Isc),
            voc: region_stat(Region::Voc),
            combined: ErrorStat::from_values(
                points
                    .iter()
                    .filter(|p| p.region.is_some())
                    .filter_map(|p| p.weighted_error),
            ),
            excluded_points: points
                .iter()
                .filter(|p| {
                    !p.absolute_error.is_finite()
                        || (p.region.is_some() && p.region_error.is_none())
                })
                .count(),
        }
    }
}

fn count(points: &[ErrorPoint], region: Option<Region>) -> usize {
    points.iter().filter(|p| p.region == region).count()
}

/// Summary as a table with `Metric`, `Mean`, `Max` and `Count` columns
pub fn summary_frame(summary: &ErrorSummary) -> Result<DataFrame> {
    let rows = summary.rows();
    let metric: Vec<&str> = rows.iter().map(|(name, _)| *name).collect();
    let mean: Vec<Option<f64>> = rows.iter().map(|(_, s)| s.map(|s| s.mean)).collect();
    let max: Vec<Option<f64>> = rows.iter().map(|(_, s)| s.map(|s| s.max)).collect();
    let count: Vec<u64> = rows
        .iter()
        .map(|(_, s)| s.map_or(0, |s| s.count as u64))
        .collect();

    Ok(DataFrame::new(vec![
        Column::new("Metric".into(), metric),
        Column::new("Mean".into(), mean),
        Column::new("Max".into(), max),
        Column::new("Count".into(), count),
    ])?)
}

/// Per-point errors as a table
pub fn profile_frame(profile: &ErrorProfile) -> Result<DataFrame> {
    let points = &profile.points;
    let region: Vec<Option<&str>> = points
        .iter()
        .map(|p| p.region.map(|r| r.name()))
        .collect();

    Ok(DataFrame::new(vec![
        Column::new(
            "Voltage (V)".into(),
            points.iter().map(|p| p.voltage).collect::<Vec<f64>>(),
        ),
        Column::new(
            "Reference Current (A)".into(),
            points.iter().map(|p| p.reference_current).collect::<Vec<f64>>(),
        ),
        Column::new(
            "Comparand Current (A)".into(),
            points.iter().map(|p| p.comparand_current).collect::<Vec<f64>>(),
        ),
        Column::new(
            "Absolute Error (A)".into(),
            points.iter().map(|p| p.absolute_error).collect::<Vec<f64>>(),
        ),
        Column::new("Region".into(), region),
        Column::new(
            "Region Error".into(),
            points.iter().map(|p| p.region_error).collect::<Vec<Option<f64>>>(),
        ),
        Column::new(
            "Weighted Error".into(),
            points.iter().map(|p| p.weighted_error).collect::<Vec<Option<f64>>>(),
        ),
    ])?)
}
