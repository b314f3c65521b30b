//! Shared domain types.
//!
//! Every value here is transient: built for one fit call and dropped once the
//! caller has extracted what it needs (summary text, fitted curve, JSON).

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::models::Model;

/// Observed samples: one or more independent columns, the dependent values,
/// and optional non-negative uncertainties.
///
/// Values are assumed finite; the caller validates that before fitting. The
/// constructors accept anything convertible into `f64` so mixed numeric
/// containers (`f32`, `i32`, `u16`, ...) are normalized up front.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    /// Independent variables, column-major (`x[column][row]`).
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
    /// Uncertainties of the independent columns (same shape as `x`).
    pub ux: Option<Vec<Vec<f64>>>,
    pub uy: Option<Vec<f64>>,
}

impl SampleSet {
    /// Single independent variable.
    pub fn new<X, Y>(x: X, y: Y) -> Self
    where
        X: IntoIterator,
        X::Item: Into<f64>,
        Y: IntoIterator,
        Y::Item: Into<f64>,
    {
        Self {
            x: vec![to_f64_vec(x)],
            y: to_f64_vec(y),
            ux: None,
            uy: None,
        }
    }

    /// Several independent variables, given as columns.
    pub fn from_columns<Y>(columns: Vec<Vec<f64>>, y: Y) -> Self
    where
        Y: IntoIterator,
        Y::Item: Into<f64>,
    {
        Self {
            x: columns,
            y: to_f64_vec(y),
            ux: None,
            uy: None,
        }
    }

    pub fn with_uy<U>(mut self, uy: U) -> Self
    where
        U: IntoIterator,
        U::Item: Into<f64>,
    {
        self.uy = Some(to_f64_vec(uy));
        self
    }

    /// Uncertainty of the first (or only) independent column.
    pub fn with_ux<U>(mut self, ux: U) -> Self
    where
        U: IntoIterator,
        U::Item: Into<f64>,
    {
        self.ux = Some(vec![to_f64_vec(ux)]);
        self
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of independent variables.
    pub fn input_count(&self) -> usize {
        self.x.len()
    }

    /// The first independent column (the only one for single-variable models).
    pub fn x_values(&self) -> &[f64] {
        self.x.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Copy row `i` of the independent columns into `row`.
    ///
    /// `row` must have length `input_count()`.
    pub fn fill_row(&self, i: usize, row: &mut [f64]) {
        for (slot, column) in row.iter_mut().zip(self.x.iter()) {
            *slot = column[i];
        }
    }

    /// Structural checks needed before indexing: equal, positive lengths.
    ///
    /// Finiteness and sign of uncertainties are the caller's responsibility.
    pub fn check_shape(&self) -> Result<(), FitError> {
        let n = self.y.len();
        if n == 0 {
            return Err(FitError::validation("sample set is empty"));
        }
        if self.x.is_empty() {
            return Err(FitError::validation("sample set has no independent variable"));
        }
        for (k, column) in self.x.iter().enumerate() {
            if column.len() != n {
                return Err(FitError::validation(format!(
                    "independent column {k} has {} values, expected {n}",
                    column.len()
                )));
            }
        }
        if let Some(ux) = &self.ux {
            if ux.len() != self.x.len() || ux.iter().any(|c| c.len() != n) {
                return Err(FitError::validation("ux does not match the shape of x"));
            }
        }
        if let Some(uy) = &self.uy {
            if uy.len() != n {
                return Err(FitError::validation(format!(
                    "uy has {} values, expected {n}",
                    uy.len()
                )));
            }
        }
        Ok(())
    }
}

fn to_f64_vec<I>(values: I) -> Vec<f64>
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    values.into_iter().map(Into::into).collect()
}

/// A named column, optionally with per-value uncertainties.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
    pub uncertainty: Option<Vec<f64>>,
}

/// A small named-column table, the input shape of formula fits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub columns: Vec<Column>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column<V>(mut self, name: impl Into<String>, values: V) -> Self
    where
        V: IntoIterator,
        V::Item: Into<f64>,
    {
        self.columns.push(Column {
            name: name.into(),
            values: to_f64_vec(values),
            uncertainty: None,
        });
        self
    }

    pub fn with_uncertain_column<V, U>(mut self, name: impl Into<String>, values: V, uncertainty: U) -> Self
    where
        V: IntoIterator,
        V::Item: Into<f64>,
        U: IntoIterator,
        U::Item: Into<f64>,
    {
        self.columns.push(Column {
            name: name.into(),
            values: to_f64_vec(values),
            uncertainty: Some(to_f64_vec(uncertainty)),
        });
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Extract a [`SampleSet`] with the given independent columns (in order)
    /// and dependent column.
    ///
    /// Column uncertainties become `ux` / `uy`. `ux` is only set when every
    /// independent column carries one.
    pub fn samples(&self, independent: &[&str], dependent: &str) -> Result<SampleSet, FitError> {
        if independent.is_empty() {
            return Err(FitError::validation("at least one independent column is required"));
        }
        let lookup = |name: &str| {
            self.column(name)
                .ok_or_else(|| FitError::validation(format!("no column named '{name}'")))
        };

        let mut x = Vec::with_capacity(independent.len());
        let mut ux = Vec::with_capacity(independent.len());
        for &name in independent {
            let column = lookup(name)?;
            x.push(column.values.clone());
            if let Some(u) = &column.uncertainty {
                ux.push(u.clone());
            }
        }

        let y_column = lookup(dependent)?;
        let samples = SampleSet {
            ux: (ux.len() == x.len()).then_some(ux),
            x,
            y: y_column.values.clone(),
            uy: y_column.uncertainty.clone(),
        };
        samples.check_shape()?;
        Ok(samples)
    }
}

/// Per-parameter box constraints `lower[i] <= θ_i <= upper[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    /// `(-∞, +∞)` for each of `n` parameters.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.iter().all(|v| *v == f64::NEG_INFINITY)
            && self.upper.iter().all(|v| *v == f64::INFINITY)
    }

    /// Check shape and ordering for `n` parameters.
    pub fn check(&self, n: usize) -> Result<(), FitError> {
        if self.lower.len() != n || self.upper.len() != n {
            return Err(FitError::validation(format!(
                "bounds have lengths ({}, {}), expected {n}",
                self.lower.len(),
                self.upper.len()
            )));
        }
        for i in 0..n {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(FitError::fitting(format!(
                    "invalid bound for parameter {i}: [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }

    /// Index of the first value outside its `[lower, upper]` interval.
    pub fn first_violation(&self, values: &[f64]) -> Option<usize> {
        values
            .iter()
            .enumerate()
            .position(|(i, v)| !(*v >= self.lower[i] && *v <= self.upper[i]))
    }

    pub fn clamp(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| v.clamp(self.lower[i], self.upper[i]))
            .collect()
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Residuals vanished (exact fit).
    ExactFit,
    GradientTolerance,
    StepTolerance,
    ObjectiveTolerance,
    /// No step could reduce the objective any further.
    Stagnation,
    MaxEvaluations,
    NumericalFailure,
}

impl TerminationReason {
    pub fn is_converged(self) -> bool {
        !matches!(self, TerminationReason::MaxEvaluations | TerminationReason::NumericalFailure)
    }
}

/// Optimizer bookkeeping attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    pub iterations: usize,
    pub evaluations: usize,
    pub reason: TerminationReason,
}

/// Goodness-of-fit statistics derived from the residual vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    /// Sample count.
    pub n: usize,
    /// Degrees of freedom `n - p`.
    pub dof: i64,
    pub ss_res: f64,
    pub ss_tot: f64,
    pub r_squared: f64,
    pub rmse: f64,
    /// Only when `uy` was supplied.
    pub chi_squared: Option<f64>,
    /// Only when `uy` was supplied and `dof > 0`.
    pub reduced_chi_squared: Option<f64>,
}

/// One fitted parameter with its uncertainty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub name: String,
    pub value: f64,
    pub std_error: Option<f64>,
    pub confidence_interval: Option<(f64, f64)>,
}

/// Output of one fit call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub parameter_names: Vec<String>,
    pub params: Vec<f64>,
    /// Parameter covariance. Absent when it cannot be scaled (unweighted fit
    /// with zero degrees of freedom).
    pub covariance: Option<DMatrix<f64>>,
    pub std_errors: Option<Vec<f64>>,
    /// `θ_k ± t·σ_k` per parameter; absent when `dof <= 0`.
    pub confidence_intervals: Option<Vec<(f64, f64)>>,
    pub confidence_level: f64,
    pub statistics: FitStatistics,
    /// Model prediction at each input row.
    pub y_predicted: Vec<f64>,
    /// `y - y_predicted`.
    pub residuals: Vec<f64>,
    pub convergence: ConvergenceInfo,
}

impl FitResult {
    /// Per-parameter view of values, standard errors and intervals.
    pub fn parameters(&self) -> Vec<ParameterEstimate> {
        self.parameter_names
            .iter()
            .enumerate()
            .map(|(k, name)| ParameterEstimate {
                name: name.clone(),
                value: self.params[k],
                std_error: self.std_errors.as_ref().map(|s| s[k]),
                confidence_interval: self.confidence_intervals.as_ref().map(|c| c[k]),
            })
            .collect()
    }

    /// Look up a fitted value by parameter name.
    pub fn param(&self, name: &str) -> Option<f64> {
        self.parameter_names
            .iter()
            .position(|n| n == name)
            .map(|k| self.params[k])
    }

    /// Evaluate the fitted single-variable curve on a new `x` grid.
    pub fn predict<M: Model + ?Sized>(&self, model: &M, x: &[f64]) -> Vec<f64> {
        model.predict_grid(x, &self.params)
    }
}

/// A built-in model fit together with its rendered equation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFit {
    pub model: String,
    pub equation: String,
    pub result: FitResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_set_converts_mixed_numeric_inputs() {
        let s = SampleSet::new(vec![1_i32, 2, 3], vec![0.5_f32, 1.5, 2.5]).with_uy([1_u8, 1, 2]);
        assert_eq!(s.x_values(), &[1.0, 2.0, 3.0]);
        assert_eq!(s.y, vec![0.5, 1.5, 2.5]);
        assert_eq!(s.uy.as_deref(), Some(&[1.0, 1.0, 2.0][..]));
        assert!(s.check_shape().is_ok());
    }

    #[test]
    fn check_shape_rejects_mismatched_columns() {
        let s = SampleSet::from_columns(vec![vec![1.0, 2.0], vec![1.0]], [1.0, 2.0]);
        assert!(matches!(s.check_shape(), Err(FitError::Validation(_))));
    }

    #[test]
    fn table_extracts_columns_and_uncertainties() {
        let table = DataTable::new()
            .with_uncertain_column("t", [1.0, 2.0, 3.0], [0.1, 0.1, 0.1])
            .with_column("u", [4.0, 5.0, 6.0])
            .with_uncertain_column("y", [1.0, 4.0, 9.0], [0.5, 0.5, 0.5]);

        let s = table.samples(&["u", "t"], "y").unwrap();
        assert_eq!(s.x, vec![vec![4.0, 5.0, 6.0], vec![1.0, 2.0, 3.0]]);
        assert!(s.ux.is_none(), "u has no uncertainty so ux is dropped");
        assert_eq!(s.uy, Some(vec![0.5, 0.5, 0.5]));

        assert!(matches!(table.samples(&["z"], "y"), Err(FitError::Validation(_))));
    }

    #[test]
    fn bounds_detect_violations() {
        let b = Bounds::new(vec![0.0, -1.0], vec![1.0, 1.0]);
        assert_eq!(b.first_violation(&[0.5, 0.0]), None);
        assert_eq!(b.first_violation(&[0.5, 2.0]), Some(1));
        assert!(Bounds::unbounded(3).is_unbounded());
        assert!(Bounds::new(vec![1.0], vec![0.0]).check(1).is_err());
    }
}
