//! Estimators for models that are linear in their parameters.
//!
//! These are closed-form least-squares solutions, so for noiseless data the
//! "guess" is already the answer and the optimizer only confirms it.

use crate::math::{fallback_scale, mean, median, polyfit};

/// Least-squares polynomial coefficients, lowest degree first.
///
/// Falls back to the constant `mean(y)` (higher coefficients zero) when the
/// design matrix cannot be solved.
pub fn estimate_polynomial(x: &[f64], y: &[f64], degree: usize) -> Vec<f64> {
    if let Some(coeffs) = polyfit(x, y, degree) {
        return coeffs;
    }
    tracing::debug!(degree, "polynomial estimate fell back to the mean");
    let mut coeffs = vec![0.0; degree + 1];
    coeffs[0] = mean(y).unwrap_or(0.0);
    coeffs
}

/// `a` in `y = a·xᵖ`: `Σ(y·xᵖ) / Σ(x²ᵖ)`.
pub fn estimate_single_power(x: &[f64], y: &[f64], power: i32) -> f64 {
    let (num, den) = x
        .iter()
        .zip(y.iter())
        .fold((0.0, 0.0), |(num, den), (&xi, &yi)| {
            let xp = xi.powi(power);
            (num + yi * xp, den + xp * xp)
        });
    let a = num / den;
    if den > 0.0 && a.is_finite() {
        a
    } else {
        tracing::debug!(power, "single power estimate fell back to the data scale");
        fallback_scale(y)
    }
}

/// `a` in `y = a·ln(x)`: least squares without intercept over `x > 0`.
pub fn estimate_ln_coefficient(x: &[f64], y: &[f64]) -> f64 {
    let (num, den) = x
        .iter()
        .zip(y.iter())
        .filter(|(xi, _)| **xi > 0.0)
        .fold((0.0, 0.0), |(num, den), (&xi, &yi)| {
            let l = xi.ln();
            (num + yi * l, den + l * l)
        });
    let a = num / den;
    if den > 0.0 && a.is_finite() {
        a
    } else {
        tracing::debug!("ln estimate fell back to the data scale");
        fallback_scale(y)
    }
}

/// `a` in `y = a/xᵖ`: the median of `y·xᵖ`.
///
/// The median keeps a single outlier from dragging the estimate the way a
/// mean would. Samples at `x = 0` are skipped (the model is undefined there).
pub fn estimate_inverse_parameter(x: &[f64], y: &[f64], power: i32) -> f64 {
    let products: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .filter(|(xi, _)| **xi != 0.0)
        .map(|(&xi, &yi)| yi * xi.powi(power))
        .collect();
    match median(&products) {
        Some(a) => a,
        None => {
            tracing::debug!(power, "inverse estimate fell back to the data scale");
            fallback_scale(y)
        }
    }
}
