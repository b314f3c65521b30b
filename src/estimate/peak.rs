//! Estimators for localized shapes: Gaussian peak and square pulse.

use crate::estimate::{mean_spacing, sorted_by_x};
use crate::math::{argmax, fallback_scale, mean, min_max, value_range};

/// `FWHM = 2·sqrt(2·ln 2)·σ`.
const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// `[A, μ, σ]` for `y = A·exp(−(x−μ)²/(2σ²))`.
///
/// The half-maximum crossings are interpolated on each side of the peak. When
/// only one side crosses, the width is mirrored from that side; when neither
/// does, a quarter of the `x` range is used.
pub fn estimate_gaussian(x: &[f64], y: &[f64]) -> Vec<f64> {
    let (xs, ys) = sorted_by_x(x, y);
    let Some(peak) = argmax(&ys) else {
        return vec![1.0, 0.0, 1.0];
    };
    let amplitude = ys[peak];
    let mu = xs[peak];
    let half = 0.5 * amplitude;

    let left = (0..peak).rev().find(|&i| ys[i] < half).map(|i| {
        let t = (half - ys[i]) / (ys[i + 1] - ys[i]);
        xs[i] + t * (xs[i + 1] - xs[i])
    });
    let right = (peak + 1..ys.len()).find(|&i| ys[i] < half).map(|i| {
        let t = (ys[i - 1] - half) / (ys[i - 1] - ys[i]);
        xs[i - 1] + t * (xs[i] - xs[i - 1])
    });

    let fwhm = match (left, right) {
        (Some(l), Some(r)) => r - l,
        (Some(l), None) => 2.0 * (mu - l),
        (None, Some(r)) => 2.0 * (r - mu),
        (None, None) => 0.0,
    };
    let sigma = if fwhm > 0.0 && fwhm.is_finite() {
        fwhm / FWHM_PER_SIGMA
    } else {
        tracing::debug!("half maximum not crossed, gaussian width from x range");
        let span = value_range(&xs);
        if span > 0.0 { 0.25 * span } else { 1.0 }
    };
    vec![amplitude, mu, sigma]
}

/// `[A, t0, w]` for a pulse of height `A` centred on `t0` with width `w`.
///
/// `A` is the peak-to-peak range, negative when the pulse points down. `t0` is
/// the `|y|`-weighted centre of mass and `w` the extent of the samples whose
/// magnitude reaches `|A|/2`, widened by one sample spacing.
pub fn estimate_square_pulse(x: &[f64], y: &[f64]) -> Vec<f64> {
    let (xs, ys) = sorted_by_x(x, y);
    let Some((lo, hi)) = min_max(&ys) else {
        return vec![1.0, 0.0, 1.0];
    };
    let ptp = hi - lo;
    let amplitude = if ptp <= 0.0 {
        tracing::debug!("flat pulse data");
        fallback_scale(&ys)
    } else if hi.abs() >= lo.abs() {
        ptp
    } else {
        -ptp
    };

    let weight: f64 = ys.iter().map(|v| v.abs()).sum();
    let t0 = if weight > 0.0 {
        xs.iter().zip(ys.iter()).map(|(x, y)| x * y.abs()).sum::<f64>() / weight
    } else {
        mean(&xs).unwrap_or(0.0)
    };

    let threshold = 0.5 * amplitude.abs();
    let inside: Vec<f64> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(_, y)| y.abs() >= threshold)
        .map(|(x, _)| *x)
        .collect();
    let dx = mean_spacing(&xs).unwrap_or(0.0);
    let width = match (inside.first(), inside.last()) {
        (Some(first), Some(last)) => last - first + dx,
        _ => 0.0,
    };
    let width = if width > 0.0 {
        width
    } else {
        let span = value_range(&xs);
        if span > 0.0 { 0.5 * span } else { 1.0 }
    };
    vec![amplitude, t0, width]
}
