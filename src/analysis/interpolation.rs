//! Cubic spline interpolation of current over voltage

use crate::config::InterpolationMode;

/// Not-a-knot cubic spline through `(voltage, current)` knots.
///
/// Knots are sorted by voltage and repeated voltages keep their first
/// occurrence in input order. The third derivative is continuous across the
/// second and the second-to-last knot, so a cubic is reproduced exactly.
/// Three knots give the parabola through them, two a straight line and a
/// single knot a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit through the finite pairs, `None` when there are none
    pub fn fit(x: &[f64], y: &[f64]) -> Option<Self> {
        let mut knots: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .map(|(&x, &y)| (x, y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if knots.is_empty() {
            return None;
        }

        // Stable sort so the first of several equal voltages survives dedup
        knots.sort_by(|a, b| a.0.total_cmp(&b.0));
        knots.dedup_by(|later, earlier| later.0 == earlier.0);

        let (x, y): (Vec<f64>, Vec<f64>) = knots.into_iter().unzip();
        let m = second_derivatives(&x, &y);
        Some(Self { x, y, m })
    }

    /// Voltage range covered by the knots
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Evaluate at `target`, handling points outside the domain per `mode`
    pub fn evaluate(&self, target: f64, mode: InterpolationMode) -> f64 {
        let n = self.x.len();
        if !target.is_finite() {
            return f64::NAN;
        }
        if n == 1 {
            return self.y[0];
        }

        let (low, high) = self.domain();
        if mode == InterpolationMode::Clamped {
            if target <= low {
                return self.y[0];
            }
            if target >= high {
                return self.y[n - 1];
            }
        }

        let segment = self
            .x
            .partition_point(|&x| x <= target)
            .saturating_sub(1)
            .min(n - 2);
        self.segment_value(segment, target)
    }

    /// Evaluate at every target
    pub fn evaluate_all(&self, targets: &[f64], mode: InterpolationMode) -> Vec<f64> {
        targets.iter().map(|&t| self.evaluate(t, mode)).collect()
    }

    fn segment_value(&self, i: usize, t: f64) -> f64 {
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let h = x1 - x0;
        let a = x1 - t;
        let b = t - x0;

        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }
}

/// Second derivatives at the knots under not-a-knot end conditions.
///
/// `M0` and `M[n-1]` are eliminated through the end conditions, which keeps
/// the system for the inner knots tridiagonal for the Thomas algorithm.
fn second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope = |i: usize| (y[i + 1] - y[i]) / h[i];

    if n == 3 {
        let curvature = 2.0 * (slope(1) - slope(0)) / (h[0] + h[1]);
        return vec![curvature; 3];
    }

    let inner = n - 2;
    let mut lower = vec![0.0; inner];
    let mut diag = vec![0.0; inner];
    let mut upper = vec![0.0; inner];
    let mut rhs = vec![0.0; inner];

    for k in 0..inner {
        let i = k + 1;
        lower[k] = h[i - 1];
        diag[k] = 2.0 * (h[i - 1] + h[i]);
        upper[k] = h[i];
        rhs[k] = 6.0 * (slope(i) - slope(i - 1));
    }

    // M0 = ((h0 + h1) M1 - h0 M2) / h1
    let (h0, h1) = (h[0], h[1]);
    diag[0] += h0 * (h0 + h1) / h1;
    upper[0] -= h0 * h0 / h1;

    // M[n-1] = ((a + b) M[n-2] - b M[n-3]) / a
    let (a, b) = (h[n - 3], h[n - 2]);
    diag[inner - 1] += b * (a + b) / a;
    lower[inner - 1] -= b * b / a;

    for k in 1..inner {
        let factor = lower[k] / diag[k - 1];
        diag[k] -= factor * upper[k - 1];
        rhs[k] -= factor * rhs[k - 1];
    }

    m[inner] = rhs[inner - 1] / diag[inner - 1];
    for k in (0..inner - 1).rev() {
        m[k + 1] = (rhs[k] - upper[k] * m[k + 2]) / diag[k];
    }

    m[0] = ((h0 + h1) * m[1] - h0 * m[2]) / h1;
    m[n - 1] = ((a + b) * m[n - 2] - b * m[n - 3]) / a;
    m
}
