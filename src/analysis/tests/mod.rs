//! Test utilities for calibration analysis
//!
//! Synthetic curves shared by the aligner and region test modules.

use crate::models::CurveSeries;


pub const EPS: f64 = 1e-9;

/// A smooth cell curve sampled at 1 V steps from 1 V to `voc`
pub fn smooth_curve(voc: u32) -> CurveSeries {
    let pairs: Vec<(f64, f64)> = (1..=voc)
        .map(|v| {
            let v = v as f64;
            (v, 3.0 - 3.0 * (v / voc as f64).powi(6))
        })
        .collect();
    CurveSeries::from_pairs(&pairs)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
