//! The model abstraction consumed by the fitter.
//!
//! A model is a pure function `(x_row, θ) → ŷ`. `x_row` holds one value per
//! independent variable, so single- and multi-variable models go through the
//! same code path; only the row width differs.

use crate::domain::SampleSet;

/// A parametric model `ŷ = f(x; θ)`.
///
/// Implementations must be stateless with respect to evaluation: the fitter
/// calls [`Model::eval`] many times with different parameter vectors.
pub trait Model {
    /// Number of parameters `θ` (after the independent variables).
    fn param_count(&self) -> usize;

    /// Number of independent variables per row.
    fn input_count(&self) -> usize {
        1
    }

    /// Evaluate the model at a single row.
    fn eval(&self, x: &[f64], params: &[f64]) -> f64;

    /// Evaluate the model at every row of `samples`.
    fn predict(&self, samples: &SampleSet, params: &[f64]) -> Vec<f64> {
        let mut row = vec![0.0; samples.input_count()];
        (0..samples.len())
            .map(|i| {
                samples.fill_row(i, &mut row);
                self.eval(&row, params)
            })
            .collect()
    }

    /// Evaluate a single-variable model on a grid of `x` values.
    fn predict_grid(&self, x: &[f64], params: &[f64]) -> Vec<f64> {
        x.iter()
            .map(|v| self.eval(std::slice::from_ref(v), params))
            .collect()
    }
}

impl<M: Model + ?Sized> Model for &M {
    fn param_count(&self) -> usize {
        (**self).param_count()
    }

    fn input_count(&self) -> usize {
        (**self).input_count()
    }

    fn eval(&self, x: &[f64], params: &[f64]) -> f64 {
        (**self).eval(x, params)
    }
}

/// Adapter turning a closure into a [`Model`].
///
/// ```
/// use curvefit::models::{FnModel, Model};
///
/// let line = FnModel::new(2, |x: &[f64], p: &[f64]| p[0] * x[0] + p[1]);
/// assert_eq!(line.eval(&[2.0], &[3.0, 1.0]), 7.0);
/// ```
pub struct FnModel<F> {
    param_count: usize,
    input_count: usize,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&[f64], &[f64]) -> f64,
{
    pub fn new(param_count: usize, f: F) -> Self {
        Self {
            param_count,
            input_count: 1,
            f,
        }
    }

    /// A closure over several independent variables.
    pub fn with_inputs(input_count: usize, param_count: usize, f: F) -> Self {
        Self {
            param_count,
            input_count,
            f,
        }
    }
}

impl<F> Model for FnModel<F>
where
    F: Fn(&[f64], &[f64]) -> f64,
{
    fn param_count(&self) -> usize {
        self.param_count
    }

    fn input_count(&self) -> usize {
        self.input_count
    }

    fn eval(&self, x: &[f64], params: &[f64]) -> f64 {
        (self.f)(x, params)
    }
}
