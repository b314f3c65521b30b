//! Guess/bounds merging: computed defaults with per-slot user overrides.
//!
//! An override slot that holds a value replaces the computed one; an empty
//! slot (`None`) keeps it. Lower and upper bounds merge independently. Inputs
//! are never modified. Override entries beyond the computed length are
//! ignored.

use crate::domain::Bounds;

/// Apply `overrides` to the `computed` guess.
pub fn merge_guess(computed: &[f64], overrides: Option<&[Option<f64>]>) -> Vec<f64> {
    let Some(overrides) = overrides else {
        return computed.to_vec();
    };
    computed
        .iter()
        .enumerate()
        .map(|(i, value)| overrides.get(i).copied().flatten().unwrap_or(*value))
        .collect()
}

/// Apply lower/upper overrides to `computed` bounds sized for `n` parameters.
///
/// Without computed bounds every slot starts at `(-∞, +∞)`.
pub fn merge_bounds(
    computed: Option<&Bounds>,
    lower: Option<&[Option<f64>]>,
    upper: Option<&[Option<f64>]>,
    n: usize,
) -> Bounds {
    let base = match computed {
        Some(bounds) => bounds.clone(),
        None => Bounds::unbounded(n),
    };
    Bounds::new(merge_guess(&base.lower, lower), merge_guess(&base.upper, upper))
}
