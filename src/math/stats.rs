//! Descriptive statistics and distribution quantiles.

use statrs::distribution::{ContinuousCDF, StudentsT};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of `values` (the mean of the two middle values for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    median_mut(&mut sorted)
}

fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// `(min, max)` over the finite values, or `None` if there are none.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// `max - min`, zero for empty input.
pub fn value_range(values: &[f64]) -> f64 {
    min_max(values).map(|(lo, hi)| hi - lo).unwrap_or(0.0)
}

/// A positive magnitude derived from the data itself, used when an estimator
/// cannot compute anything better: the largest `|value|`, or `1.0` if every
/// value is zero.
pub fn fallback_scale(values: &[f64]) -> f64 {
    let scale = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale > 0.0 { scale } else { 1.0 }
}

/// Index of the first maximum (ties resolve to the lowest index).
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        match best {
            Some(b) if values[b] >= v => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Two-tailed critical value of Student's t with `dof` degrees of freedom,
/// i.e. the `(1 + level) / 2` quantile.
///
/// Returns `None` for `dof == 0` or a level outside `(0, 1)`.
pub fn student_t_critical(level: f64, dof: u64) -> Option<f64> {
    if dof == 0 || !(level > 0.0 && level < 1.0) {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, dof as f64).ok()?;
    let t = dist.inverse_cdf(0.5 * (1.0 + level));
    t.is_finite().then_some(t)
}

/// Indices that sort `values` ascending (stable, NaN treated as equal).
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn argmax_prefers_first_tie() {
        assert_eq!(argmax(&[1.0, 5.0, 5.0, 2.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn t_critical_matches_tables() {
        // Standard two-tailed 95% table values.
        let t1 = student_t_critical(0.95, 1).unwrap();
        let t10 = student_t_critical(0.95, 10).unwrap();
        let t30 = student_t_critical(0.95, 30).unwrap();
        assert!((t1 - 12.7062).abs() < 1e-3, "t1 = {t1}");
        assert!((t10 - 2.2281).abs() < 1e-3, "t10 = {t10}");
        assert!((t30 - 2.0423).abs() < 1e-3, "t30 = {t30}");
        assert!(student_t_critical(0.95, 0).is_none());
    }

    #[test]
    fn fallback_scale_is_positive() {
        assert_eq!(fallback_scale(&[0.0, 0.0]), 1.0);
        assert_eq!(fallback_scale(&[-4.0, 2.0]), 4.0);
    }
}
