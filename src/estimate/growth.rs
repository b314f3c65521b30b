//! Estimators for monotone growth/decay models: exponential and logistic.

use crate::estimate::{first_crossing, sorted_by_x};
use crate::math::{fallback_scale, linear_regression, mean, min_max, value_range};

/// `ln(81)`: the logistic rises from 10% to 90% over `ln(81)/b`.
const LOGISTIC_10_90: f64 = 4.394_449_154_672_439;

/// `[a, b]` for `y = a·exp(b·x)`.
///
/// With strictly positive `y` this is the regression line of `ln(y)` on `x`.
/// Otherwise the curve is pinned through the first and last points (by `x`),
/// which works for all-negative data too; mixed signs get a flat guess.
pub fn estimate_exponential(x: &[f64], y: &[f64]) -> Vec<f64> {
    if !y.is_empty() && y.iter().all(|v| *v > 0.0) {
        let ln_y: Vec<f64> = y.iter().map(|v| v.ln()).collect();
        if let Some((intercept, slope)) = linear_regression(x, &ln_y) {
            let a = intercept.exp();
            if a.is_finite() && slope.is_finite() {
                return vec![a, slope];
            }
        }
    }

    let (xs, ys) = sorted_by_x(x, y);
    if let (Some(&x0), Some(&x1), Some(&y0), Some(&y1)) = (xs.first(), xs.last(), ys.first(), ys.last()) {
        if x1 > x0 && y0 * y1 > 0.0 {
            let b = (y1 / y0).ln() / (x1 - x0);
            let a = y0 * (-b * x0).exp();
            if a.is_finite() && b.is_finite() {
                tracing::debug!("exponential estimate from end points");
                return vec![a, b];
            }
        }
    }

    tracing::debug!("exponential estimate fell back to a flat curve");
    let a = mean(y).filter(|m| *m != 0.0).unwrap_or_else(|| fallback_scale(y));
    vec![a, 0.0]
}

/// `[a, b, c]` for `y = a/(1 + exp(−b·(x − c)))`.
///
/// `a` is the range of `y`, `c` the first `x` where the data crosses the
/// middle of that range, and `b` comes from the 10%–90% rise width. The sign
/// of `b` follows the overall trend (last point against first).
pub fn estimate_logistic(x: &[f64], y: &[f64]) -> Vec<f64> {
    let (xs, ys) = sorted_by_x(x, y);
    let Some((lo, hi)) = min_max(&ys) else {
        return vec![1.0, 1.0, 0.0];
    };
    let a = hi - lo;
    let x_mid = mean(&xs).unwrap_or(0.0);
    if a <= 0.0 {
        tracing::debug!("flat logistic data");
        return vec![fallback_scale(&ys), 1.0, x_mid];
    }

    let rising = ys.last() >= ys.first();
    let sign = if rising { 1.0 } else { -1.0 };
    let c = first_crossing(&xs, &ys, lo + 0.5 * a).unwrap_or(x_mid);

    let width = match (
        first_crossing(&xs, &ys, lo + 0.1 * a),
        first_crossing(&xs, &ys, lo + 0.9 * a),
    ) {
        (Some(p10), Some(p90)) => (p90 - p10).abs(),
        _ => 0.0,
    };
    let b = if width > 0.0 {
        sign * LOGISTIC_10_90 / width
    } else {
        let span = value_range(&xs);
        tracing::debug!("logistic transition width not resolved");
        if span > 0.0 {
            sign * LOGISTIC_10_90 / span
        } else {
            sign
        }
    };
    vec![a, b, c]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_recovers_positive_data() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.5 * (0.3 * v).exp()).collect();
        let g = estimate_exponential(&x, &y);
        assert!((g[0] - 2.5).abs() < 1e-9);
        assert!((g[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn exponential_negative_data_uses_end_points() {
        let x = [0.0, 1.0, 2.0];
        let y = [-1.0, -2.0, -4.0];
        let g = estimate_exponential(&x, &y);
        assert!((g[0] + 1.0).abs() < 1e-12);
        assert!((g[1] - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn exponential_mixed_signs_is_flat() {
        let g = estimate_exponential(&[0.0, 1.0, 2.0], &[-1.0, 0.0, 4.0]);
        assert_eq!(g[1], 0.0);
        assert!(g[0].is_finite() && g[0] != 0.0);
    }

    #[test]
    fn logistic_guess_finds_midpoint_and_width() {
        let x: Vec<f64> = (0..=100).map(|i| f64::from(i) * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| 4.0 / (1.0 + (-2.0 * (v - 5.0)).exp())).collect();
        let g = estimate_logistic(&x, &y);
        assert!((g[0] - 4.0).abs() < 1e-3);
        assert!((g[1] - 2.0).abs() < 0.1, "b = {}", g[1]);
        assert!((g[2] - 5.0).abs() < 1e-2);
    }

    #[test]
    fn logistic_decreasing_gets_negative_rate() {
        let x: Vec<f64> = (0..=40).map(|i| f64::from(i) * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.0 / (1.0 + (1.5 * (v - 4.0)).exp())).collect();
        let g = estimate_logistic(&x, &y);
        assert!(g[1] < 0.0);
    }
}
