//! Linear least squares.
//!
//! Polynomial estimators reduce to small linear regression problems:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! solved by [`solve_least_squares`]. The straight line used for the
//! log-linearized exponential has its own closed form, [`linear_regression`].
//!
//! Implementation choices:
//! - We use SVD so tall design matrices (more rows than columns) and
//!   rank-deficient ones (repeated x values) both yield a usable solution.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is tiny (≤ 5 columns), so SVD cost is irrelevant.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Least-squares polynomial of the given degree.
///
/// Coefficients are returned lowest degree first: `[c0, c1, ..., c_degree]`.
/// Columns are built on `x` centred and scaled to `[-1, 1]` and mapped back
/// afterwards, which keeps the Vandermonde matrix well conditioned for large
/// or offset `x`.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = x.len().min(y.len());
    if n == 0 {
        return None;
    }

    let (lo, hi) = x[..n]
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let shift = 0.5 * (lo + hi);
    let half = 0.5 * (hi - lo);
    let scale = if half > 0.0 { half } else { 1.0 };

    let cols = degree + 1;
    let mut design = DMatrix::<f64>::zeros(n, cols);
    for i in 0..n {
        let u = (x[i] - shift) / scale;
        let mut p = 1.0;
        for j in 0..cols {
            design[(i, j)] = p;
            p *= u;
        }
    }
    let rhs = DVector::from_column_slice(&y[..n]);
    let scaled = solve_least_squares(&design, &rhs)?;

    // Expand Σ b_j ((x - s)/k)^j into powers of x.
    let mut coeffs = vec![0.0; cols];
    for (j, &b) in scaled.iter().enumerate() {
        let factor = b / scale.powi(j as i32);
        for m in 0..=j {
            let term = factor * binomial(j, m) * (-shift).powi((j - m) as i32);
            coeffs[m] += term;
        }
    }
    coeffs.iter().all(|c| c.is_finite()).then_some(coeffs)
}

/// Ordinary least squares line `y = intercept + slope·x`.
///
/// Returns `(intercept, slope)`, or `None` when `x` has no spread.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let x_bar = x[..n].iter().sum::<f64>() / nf;
    let y_bar = y[..n].iter().sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var = 0.0;
    for i in 0..n {
        let dx = x[i] - x_bar;
        cov += dx * (y[i] - y_bar);
        var += dx * dx;
    }
    if var <= f64::MIN_POSITIVE || !cov.is_finite() {
        return None;
    }
    let slope = cov / var;
    Some((y_bar - slope * x_bar, slope))
}

fn binomial(n: usize, k: usize) -> f64 {
    let mut out = 1.0;
    for i in 0..k {
        out = out * (n - i) as f64 / (i + 1) as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn polyfit_recovers_offset_quadratic() {
        let x: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 * v * v - 3.0 * v + 7.0).collect();
        let c = polyfit(&x, &y, 2).unwrap();
        assert!((c[0] - 7.0).abs() < 1e-5, "c0 = {}", c[0]);
        assert!((c[1] + 3.0).abs() < 1e-7, "c1 = {}", c[1]);
        assert!((c[2] - 0.5).abs() < 1e-9, "c2 = {}", c[2]);
    }

    #[test]
    fn linear_regression_needs_spread() {
        assert!(linear_regression(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        let (a, b) = linear_regression(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((a - 1.0).abs() < 1e-12);
        assert!((b - 2.0).abs() < 1e-12);
    }
}
