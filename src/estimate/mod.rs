//! Initial-guess estimators, one per model family.
//!
//! Every estimator takes raw `(x, y)` samples (finite, equal length, any
//! order) and returns a guess. None of them fail: degenerate inputs (fewer
//! than two distinct `x`, constant `y`, ...) produce a fallback derived from
//! the data's own scale, and the fallback is logged at `debug` level.

pub mod growth;
pub mod peak;
pub mod periodic;
pub mod polynomial;

pub use growth::*;
pub use peak::*;
pub use periodic::*;
pub use polynomial::*;

use crate::math::argsort;

/// Copies of `x` and `y` sorted by ascending `x`.
pub(crate) fn sorted_by_x(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len().min(y.len());
    let order = argsort(&x[..n]);
    let xs = order.iter().map(|&i| x[i]).collect();
    let ys = order.iter().map(|&i| y[i]).collect();
    (xs, ys)
}

/// `x` at which the sorted series first reaches `level`, linearly
/// interpolated between the bracketing samples.
pub(crate) fn first_crossing(xs: &[f64], ys: &[f64], level: f64) -> Option<f64> {
    if ys.first() == Some(&level) {
        return xs.first().copied();
    }
    for i in 0..ys.len().saturating_sub(1) {
        let (a, b) = (ys[i] - level, ys[i + 1] - level);
        if b == 0.0 {
            return Some(xs[i + 1]);
        }
        if a * b < 0.0 {
            let t = a / (a - b);
            return Some(xs[i] + t * (xs[i + 1] - xs[i]));
        }
    }
    None
}

/// Mean spacing of sorted `xs`, or `None` when all values coincide.
pub(crate) fn mean_spacing(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let span = xs[xs.len() - 1] - xs[0];
    let dx = span / (xs.len() - 1) as f64;
    (dx > 0.0 && dx.is_finite()).then_some(dx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_interpolates() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 2.0, 4.0];
        assert_eq!(first_crossing(&xs, &ys, 1.0), Some(0.5));
        assert_eq!(first_crossing(&xs, &ys, 4.0), Some(2.0));
        assert_eq!(first_crossing(&xs, &ys, 9.0), None);
    }

    #[test]
    fn sorting_keeps_pairs_together() {
        let (xs, ys) = sorted_by_x(&[3.0, 1.0, 2.0], &[30.0, 10.0, 20.0]);
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(ys, vec![10.0, 20.0, 30.0]);
    }
}
