//! Reporting utilities: per-sample residuals, outlier ranking, and formatted
//! terminal output.

pub mod format;

pub use format::*;

use crate::domain::{FitResult, SampleSet};

/// One observation next to its fitted value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualRow {
    pub index: usize,
    /// First independent variable.
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    pub residual: f64,
}

/// Pair every sample with its prediction and residual.
pub fn residual_rows(samples: &SampleSet, result: &FitResult) -> Vec<ResidualRow> {
    let x = samples.x_values();
    result
        .y_predicted
        .iter()
        .zip(result.residuals.iter())
        .enumerate()
        .map(|(index, (y_fit, residual))| ResidualRow {
            index,
            x: x.get(index).copied().unwrap_or(f64::NAN),
            y_obs: samples.y[index],
            y_fit: *y_fit,
            residual: *residual,
        })
        .collect()
}

/// The `top_n` rows with the largest `|residual|`; ties keep sample order.
pub fn largest_residuals(rows: &[ResidualRow], top_n: usize) -> Vec<ResidualRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .abs()
            .partial_cmp(&a.residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}
