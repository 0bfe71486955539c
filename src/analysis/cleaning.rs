//! Reference series cleaning
//!
//! Removes the tail recorded after a tracer reset and low-voltage current
//! spikes before the reference is compared against anything.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CleaningConfig;
use crate::models::CurveSeries;

/// What cleaning removed from a reference series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Points before cleaning
    pub original_len: usize,

    /// Index of the last point kept before a tracer reset
    pub collapse_index: Option<usize>,

    /// Points discarded after the reset
    pub truncated_points: usize,

    /// Low-voltage points discarded by the spike filter
    pub spike_points: usize,

    /// Current threshold of the spike filter, `None` when it was skipped
    pub spike_threshold: Option<f64>,
}

impl CleaningReport {
    pub fn removed_points(&self) -> usize {
        self.truncated_points + self.spike_points
    }
}

/// Truncate at the first tracer reset, then drop low-voltage spikes
pub fn clean_reference(series: &CurveSeries, config: &CleaningConfig) -> (CurveSeries, CleaningReport) {
    let mut report = CleaningReport {
        original_len: series.len(),
        ..CleaningReport::default()
    };

    let truncated = match find_collapse(
        series.voltage(),
        config.collapse_high_voltage,
        config.collapse_low_voltage,
    ) {
        Some(idx) => {
            let voltage = series.voltage();
            warn!(
                "Abrupt voltage drop at index {} (from {:.2}V to {:.2}V); discarding {} points after it",
                idx,
                voltage[idx],
                voltage[idx + 1],
                series.len() - idx - 1
            );
            report.collapse_index = Some(idx);
            report.truncated_points = series.len() - idx - 1;
            series.truncated(idx + 1)
        }
        None => series.clone(),
    };

    let bound = config.low_voltage_bound;
    let above: Vec<f64> = truncated
        .voltage()
        .iter()
        .zip(truncated.current())
        .filter(|&(&v, _)| v >= bound)
        .map(|(_, &c)| c)
        .collect();

    let Some(threshold) = percentile(&above, config.spike_percentile) else {
        warn!(
            "No reference points at or above {}V; spike filter skipped",
            bound
        );
        return (truncated, report);
    };

    let filtered = truncated.filtered(|v, c| v >= bound || c < threshold);
    report.spike_threshold = Some(threshold);
    report.spike_points = truncated.len() - filtered.len();

    if report.spike_points > 0 {
        debug!(
            "Spike filter removed {} points below {}V (threshold {:.4}A)",
            report.spike_points, bound, threshold
        );
    }

    (filtered, report)
}

/// First `i` with `voltage[i] > high` and `voltage[i + 1] < low`
pub fn find_collapse(voltage: &[f64], high: f64, low: f64) -> Option<usize> {
    voltage
        .windows(2)
        .position(|pair| pair[0] > high && pair[1] < low)
}

/// Percentile of the finite values with linear interpolation between order
/// statistics. `p` is in 0-100.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert!((percentile(&values, 90.0).unwrap() - 4.6).abs() < 1e-12);
        assert!((percentile(&[10.0, 0.0], 25.0).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_of_nothing() {
        assert_eq!(percentile(&[], 90.0), None);
        assert_eq!(percentile(&[f64::NAN], 90.0), None);
    }

    #[test]
    fn test_find_collapse_first_occurrence() {
        let voltage = [0.0, 5.0, 12.0, 0.5, 11.0, 0.2];
        assert_eq!(find_collapse(&voltage, 10.0, 1.0), Some(2));
        assert_eq!(find_collapse(&[0.0, 5.0, 10.0, 0.5], 10.0, 1.0), None);
        assert_eq!(find_collapse(&[], 10.0, 1.0), None);
    }

    #[test]
    fn test_spike_filter_skipped_without_high_voltage_points() {
        let series = CurveSeries::from_pairs(&[(0.1, 5.0), (0.5, 4.0)]);
        let (cleaned, report) = clean_reference(&series, &CleaningConfig::default());

        assert_eq!(cleaned, series);
        assert_eq!(report.spike_threshold, None);
        assert_eq!(report.removed_points(), 0);
    }

    #[test]
    fn test_spike_filter_keeps_low_voltage_points_below_threshold() {
        let series = CurveSeries::from_pairs(&[
            (0.2, 9.0),
            (0.5, 0.5),
            (2.0, 1.0),
            (4.0, 1.0),
            (6.0, 1.0),
        ]);
        let (cleaned, report) = clean_reference(&series, &CleaningConfig::default());

        assert_eq!(report.spike_threshold, Some(1.0));
        assert_eq!(report.spike_points, 1);
        assert_eq!(cleaned.voltage(), &[0.5, 2.0, 4.0, 6.0]);
    }
}
