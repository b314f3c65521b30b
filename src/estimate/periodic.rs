//! Estimators for oscillating (`sin`, `cos`) and hyperbolic (`sinh`, `cosh`)
//! models.
//!
//! Trigonometric guesses are built in three steps:
//!
//! - amplitude: half the peak-to-peak range of `y`;
//! - angular frequency: mean spacing of detected peaks, falling back to the
//!   autocorrelation period, then to one period over the `x` range;
//! - phase: a grid search over `[-π, π)` for the offset that minimizes the
//!   squared error given the amplitude and frequency above. Grid points are
//!   scored in parallel; the lowest SSE wins and ties go to the lowest index,
//!   so the result does not depend on thread scheduling.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::domain::Bounds;
use crate::estimate::{mean_spacing, sorted_by_x};
use crate::math::{autocorrelation_lag, mean_peak_spacing, min_max, peak_positions, value_range};

/// Number of phase candidates in `[-π, π)`.
pub const PHASE_GRID_SIZE: usize = 720;

/// Largest `|b·x|` allowed by the hyperbolic bounds; `e^700` is still finite.
pub const HYPERBOLIC_EXPONENT_CAP: f64 = 700.0;

/// Which trigonometric function the model uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Cosine,
}

impl Wave {
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Wave::Sine => v.sin(),
            Wave::Cosine => v.cos(),
        }
    }
}

/// `[a, b, c]` for `y = a·wave(b·x + c)`.
pub fn estimate_trig(x: &[f64], y: &[f64], wave: Wave) -> Vec<f64> {
    let a = estimate_trig_amplitude(y);
    let b = estimate_angular_frequency(x, y);
    let c = estimate_phase(x, y, a, b, wave);
    vec![a, b, c]
}

/// Half the peak-to-peak range of `y`, or `1.0` for constant data.
pub fn estimate_trig_amplitude(y: &[f64]) -> f64 {
    let half = 0.5 * value_range(y);
    if half > 0.0 {
        half
    } else {
        tracing::debug!("flat signal, trig amplitude set to 1");
        1.0
    }
}

/// Angular frequency `2π / period`.
pub fn estimate_angular_frequency(x: &[f64], y: &[f64]) -> f64 {
    let (xs, ys) = sorted_by_x(x, y);
    let Some((lo, hi)) = min_max(&ys) else {
        return 1.0;
    };
    let threshold = lo + 0.75 * (hi - lo);

    if hi > lo {
        let peaks = peak_positions(&xs, &ys, threshold);
        if let Some(period) = mean_peak_spacing(&peaks) {
            return 2.0 * PI / period;
        }
        tracing::debug!(peaks = peaks.len(), "too few peaks, trying autocorrelation");

        if let (Some(lag), Some(dx)) = (autocorrelation_lag(&ys), mean_spacing(&xs)) {
            let period = lag * dx;
            if period > 0.0 && period.is_finite() {
                return 2.0 * PI / period;
            }
        }
    }

    let span = value_range(&xs);
    if span > 0.0 {
        tracing::debug!("no period detected, assuming one cycle over the x range");
        2.0 * PI / span
    } else {
        1.0
    }
}

/// Phase `c` minimizing `Σ (y − a·wave(b·x + c))²` over a fixed grid.
pub fn estimate_phase(x: &[f64], y: &[f64], amplitude: f64, omega: f64, wave: Wave) -> f64 {
    let step = 2.0 * PI / PHASE_GRID_SIZE as f64;
    let scored: Vec<(usize, f64)> = (0..PHASE_GRID_SIZE)
        .into_par_iter()
        .map(|k| {
            let c = -PI + k as f64 * step;
            let sse: f64 = x
                .iter()
                .zip(y.iter())
                .map(|(&xi, &yi)| {
                    let r = yi - amplitude * wave.apply(omega * xi + c);
                    r * r
                })
                .sum();
            (k, sse)
        })
        .collect();

    let mut best = (0usize, f64::INFINITY);
    for &(k, sse) in &scored {
        if sse < best.1 || (sse == best.1 && k < best.0) {
            best = (k, sse);
        }
    }
    -PI + best.0 as f64 * step
}

/// `[a, b]` for `y = a·sinh(b·x)` or `y = a·cosh(b·x)`.
///
/// `b` starts at the inverse of the `x` range and never exceeds the cap used
/// by [`estimate_hyperbolic_bounds`], so the guess is always inside them.
pub fn estimate_hyperbolic(x: &[f64], y: &[f64]) -> Vec<f64> {
    let half = 0.5 * value_range(y);
    let a = if half > 0.0 { half } else { 1.0 };
    let span = value_range(x);
    let b = if span > 0.0 { 1.0 / span } else { 1.0 };
    vec![a, b.min(hyperbolic_frequency_cap(x))]
}

/// Bounds keeping `|b·x| ≤ 700` over the data; `a` stays unbounded.
pub fn estimate_hyperbolic_bounds(x: &[f64]) -> Bounds {
    let cap = hyperbolic_frequency_cap(x);
    Bounds::new(vec![f64::NEG_INFINITY, -cap], vec![f64::INFINITY, cap])
}

fn hyperbolic_frequency_cap(x: &[f64]) -> f64 {
    let max_abs = x.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max_abs > 0.0 {
        HYPERBOLIC_EXPONENT_CAP / max_abs
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize, dx: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * dx).collect()
    }

    #[test]
    fn sine_guess_is_close() {
        let x = grid(200, 0.05);
        let y: Vec<f64> = x.iter().map(|v| 2.0 * (3.0 * v + 0.5).sin()).collect();
        let g = estimate_trig(&x, &y, Wave::Sine);
        assert!((g[0] - 2.0).abs() < 0.02, "a = {}", g[0]);
        assert!((g[1] - 3.0).abs() < 0.1, "b = {}", g[1]);
        assert!(g[2] >= -PI && g[2] < PI);
    }

    #[test]
    fn phase_search_hits_grid_resolution() {
        let x = grid(100, 0.1);
        let y: Vec<f64> = x.iter().map(|v| 1.5 * (2.0 * v - 1.0).cos()).collect();
        let c = estimate_phase(&x, &y, 1.5, 2.0, Wave::Cosine);
        assert!((c + 1.0).abs() <= 2.0 * PI / PHASE_GRID_SIZE as f64);
    }

    #[test]
    fn frequency_without_two_peaks_uses_autocorrelation() {
        // cos over 2.1 periods of 40 samples: the runs above the threshold at
        // both ends touch the edges, leaving a single interior peak.
        let x = grid(85, 0.1);
        let y: Vec<f64> = x.iter().map(|v| (0.5 * PI * v).cos()).collect();
        assert_eq!(peak_positions(&x, &y, 0.5).len(), 1);

        let w = estimate_angular_frequency(&x, &y);
        let truth = 0.5 * PI;
        assert!((w - truth).abs() < 0.05 * truth, "w = {w}");
        // Not the one-cycle-over-the-range fallback.
        assert!((w - 2.0 * PI / 8.4).abs() > 0.5);
    }

    #[test]
    fn frequency_handles_single_distinct_x() {
        assert_eq!(estimate_angular_frequency(&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0]), 1.0);
    }

    #[test]
    fn hyperbolic_guess_stays_inside_bounds() {
        let x = [-1000.0, 0.0, 1000.0];
        let y = [-5.0, 0.0, 5.0];
        let g = estimate_hyperbolic(&x, &y);
        let bounds = estimate_hyperbolic_bounds(&x);
        assert_eq!(bounds.first_violation(&g), None);
        assert!((bounds.upper[1] - 0.7).abs() < 1e-12);
        assert!(bounds.lower[0].is_infinite() && bounds.upper[0].is_infinite());
    }
}
