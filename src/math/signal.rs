//! Period detection for oscillating samples.
//!
//! Two methods, both operating on samples already sorted by `x`:
//!
//! - [`peak_positions`]: split the series into runs above a threshold and
//!   keep the highest interior point of each run. Runs touching either end of
//!   the series are ignored because their maximum may be a truncated peak.
//! - [`autocorrelation_lag`]: first local maximum of the normalized
//!   autocorrelation after its first zero crossing, refined with a parabola
//!   through the three surrounding lags. Lags are in samples, so the caller
//!   converts with the mean `x` spacing.

/// `x` positions of the peaks rising above `threshold`.
pub fn peak_positions(x: &[f64], y: &[f64], threshold: f64) -> Vec<f64> {
    let n = x.len().min(y.len());
    let mut peaks = Vec::new();
    let mut i = 0;
    while i < n {
        if y[i] <= threshold {
            i += 1;
            continue;
        }
        let start = i;
        let mut best = i;
        while i < n && y[i] > threshold {
            if y[i] > y[best] {
                best = i;
            }
            i += 1;
        }
        let end = i; // exclusive
        let touches_edge = start == 0 || end == n;
        if !touches_edge {
            peaks.push(x[best]);
        }
    }
    peaks
}

/// Mean spacing between consecutive peaks, if at least two are present.
pub fn mean_peak_spacing(peaks: &[f64]) -> Option<f64> {
    if peaks.len() < 2 {
        return None;
    }
    let span = peaks[peaks.len() - 1] - peaks[0];
    let spacing = span / (peaks.len() - 1) as f64;
    (spacing.is_finite() && spacing > 0.0).then_some(spacing)
}

/// Normalized (biased) autocorrelation `r(0..max_lag]` of `y` about its mean.
///
/// Returns an empty vector for constant input.
pub fn autocorrelation(y: &[f64], max_lag: usize) -> Vec<f64> {
    let n = y.len();
    if n < 2 {
        return Vec::new();
    }
    let m = y.iter().sum::<f64>() / n as f64;
    let centred: Vec<f64> = y.iter().map(|v| v - m).collect();
    let denom: f64 = centred.iter().map(|v| v * v).sum();
    if denom <= 0.0 || !denom.is_finite() {
        return Vec::new();
    }

    let max_lag = max_lag.min(n - 1);
    (0..=max_lag)
        .map(|k| {
            let s: f64 = centred[..n - k]
                .iter()
                .zip(centred[k..].iter())
                .map(|(a, b)| a * b)
                .sum();
            s / denom
        })
        .collect()
}

/// Dominant period of `y`, in samples (possibly fractional).
///
/// Lags are searched up to `n / 2`.
pub fn autocorrelation_lag(y: &[f64]) -> Option<f64> {
    let n = y.len();
    if n < 4 {
        return None;
    }
    // A period longer than half the series has no second cycle to confirm it.
    let r = autocorrelation(y, n / 2);
    if r.len() < 3 {
        return None;
    }

    let first_negative = r.iter().position(|&v| v < 0.0)?;
    for k in first_negative.max(1)..r.len() - 1 {
        let is_local_max = r[k] >= r[k - 1] && r[k] > r[k + 1];
        if is_local_max && r[k] > 0.0 {
            let denom = r[k - 1] - 2.0 * r[k] + r[k + 1];
            let shift = if denom.abs() > f64::EPSILON {
                (0.5 * (r[k - 1] - r[k + 1]) / denom).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            return Some(k as f64 + shift);
        }
    }
    None
}
