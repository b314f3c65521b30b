//! Built-in model families.
//!
//! The set of built-in models is closed: [`ModelKind`] is the registry, and
//! every per-model behaviour (parameter names, display template, evaluation,
//! initial guess, default bounds) is a `match` over it. Names parse through
//! [`std::str::FromStr`], so an unknown name is a `Validation` error instead of
//! a failed runtime lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Bounds;
use crate::error::FitError;
use crate::estimate;
use crate::models::Model;

/// A built-in model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// `y = m·x + n`
    Linear,
    /// `y = m·x`
    LinearOrigin,
    /// `y = a·x² + b·x + c`
    Quadratic,
    /// `y = a·x³ + b·x² + c·x + d`
    Cubic,
    /// `y = a·x⁴ + b·x³ + c·x² + d·x + e`
    Quartic,
    /// `y = a·x²`
    SquareOrigin,
    /// `y = a·x³`
    CubeOrigin,
    /// `y = a·sin(b·x + c)`
    Sin,
    /// `y = a·cos(b·x + c)`
    Cos,
    /// `y = a·sinh(b·x)`
    Sinh,
    /// `y = a·cosh(b·x)`
    Cosh,
    /// `y = a·ln(x)`
    Ln,
    /// `y = a/x`
    Inverse,
    /// `y = a/x²`
    InverseSquare,
    /// `y = A·exp(−(x−μ)²/(2σ²))`
    Gaussian,
    /// `y = a·exp(b·x)`
    Exponential,
    /// `y = a/(1 + exp(−b·(x−c)))`
    Logistic,
    /// `y = A` for `|x − t0| ≤ w/2`, else `0`
    SquarePulse,
}

impl ModelKind {
    pub const ALL: [ModelKind; 18] = [
        ModelKind::Linear,
        ModelKind::LinearOrigin,
        ModelKind::Quadratic,
        ModelKind::Cubic,
        ModelKind::Quartic,
        ModelKind::SquareOrigin,
        ModelKind::CubeOrigin,
        ModelKind::Sin,
        ModelKind::Cos,
        ModelKind::Sinh,
        ModelKind::Cosh,
        ModelKind::Ln,
        ModelKind::Inverse,
        ModelKind::InverseSquare,
        ModelKind::Gaussian,
        ModelKind::Exponential,
        ModelKind::Logistic,
        ModelKind::SquarePulse,
    ];

    /// Registry name (also the serde / CLI spelling).
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::LinearOrigin => "linear_origin",
            ModelKind::Quadratic => "quadratic",
            ModelKind::Cubic => "cubic",
            ModelKind::Quartic => "quartic",
            ModelKind::SquareOrigin => "square_origin",
            ModelKind::CubeOrigin => "cube_origin",
            ModelKind::Sin => "sin",
            ModelKind::Cos => "cos",
            ModelKind::Sinh => "sinh",
            ModelKind::Cosh => "cosh",
            ModelKind::Ln => "ln",
            ModelKind::Inverse => "inverse",
            ModelKind::InverseSquare => "inverse_square",
            ModelKind::Gaussian => "gaussian",
            ModelKind::Exponential => "exponential",
            ModelKind::Logistic => "logistic",
            ModelKind::SquarePulse => "square_pulse",
        }
    }

    /// Parameter names in positional order.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Linear => &["m", "n"],
            ModelKind::LinearOrigin => &["m"],
            ModelKind::Quadratic => &["a", "b", "c"],
            ModelKind::Cubic => &["a", "b", "c", "d"],
            ModelKind::Quartic => &["a", "b", "c", "d", "e"],
            ModelKind::SquareOrigin | ModelKind::CubeOrigin => &["a"],
            ModelKind::Sin | ModelKind::Cos => &["a", "b", "c"],
            ModelKind::Sinh | ModelKind::Cosh => &["a", "b"],
            ModelKind::Ln | ModelKind::Inverse | ModelKind::InverseSquare => &["a"],
            ModelKind::Gaussian => &["A", "mu", "sigma"],
            ModelKind::Exponential => &["a", "b"],
            ModelKind::Logistic => &["a", "b", "c"],
            ModelKind::SquarePulse => &["A", "t0", "w"],
        }
    }

    /// Display template with `{name}` placeholders for each parameter.
    pub fn template(self) -> &'static str {
        match self {
            ModelKind::Linear => "y = {m}*x + {n}",
            ModelKind::LinearOrigin => "y = {m}*x",
            ModelKind::Quadratic => "y = {a}*x^2 + {b}*x + {c}",
            ModelKind::Cubic => "y = {a}*x^3 + {b}*x^2 + {c}*x + {d}",
            ModelKind::Quartic => "y = {a}*x^4 + {b}*x^3 + {c}*x^2 + {d}*x + {e}",
            ModelKind::SquareOrigin => "y = {a}*x^2",
            ModelKind::CubeOrigin => "y = {a}*x^3",
            ModelKind::Sin => "y = {a}*sin({b}*x + {c})",
            ModelKind::Cos => "y = {a}*cos({b}*x + {c})",
            ModelKind::Sinh => "y = {a}*sinh({b}*x)",
            ModelKind::Cosh => "y = {a}*cosh({b}*x)",
            ModelKind::Ln => "y = {a}*ln(x)",
            ModelKind::Inverse => "y = {a}/x",
            ModelKind::InverseSquare => "y = {a}/x^2",
            ModelKind::Gaussian => "y = {A}*exp(-(x - {mu})^2/(2*{sigma}^2))",
            ModelKind::Exponential => "y = {a}*exp({b}*x)",
            ModelKind::Logistic => "y = {a}/(1 + exp(-{b}*(x - {c})))",
            ModelKind::SquarePulse => "y = {A} for |x - {t0}| <= {w}/2, else 0",
        }
    }

    /// Initial guess computed from the samples by the matching estimator.
    pub fn initial_guess(self, x: &[f64], y: &[f64]) -> Vec<f64> {
        // Polynomial estimators return lowest degree first; these models list
        // their coefficients highest degree first.
        let poly_desc = |degree: usize| {
            let mut c = estimate::estimate_polynomial(x, y, degree);
            c.reverse();
            c
        };
        match self {
            ModelKind::Linear => poly_desc(1),
            ModelKind::LinearOrigin => vec![estimate::estimate_single_power(x, y, 1)],
            ModelKind::Quadratic => poly_desc(2),
            ModelKind::Cubic => poly_desc(3),
            ModelKind::Quartic => poly_desc(4),
            ModelKind::SquareOrigin => vec![estimate::estimate_single_power(x, y, 2)],
            ModelKind::CubeOrigin => vec![estimate::estimate_single_power(x, y, 3)],
            ModelKind::Sin => estimate::estimate_trig(x, y, estimate::Wave::Sine),
            ModelKind::Cos => estimate::estimate_trig(x, y, estimate::Wave::Cosine),
            ModelKind::Sinh | ModelKind::Cosh => estimate::estimate_hyperbolic(x, y),
            ModelKind::Ln => vec![estimate::estimate_ln_coefficient(x, y)],
            ModelKind::Inverse => vec![estimate::estimate_inverse_parameter(x, y, 1)],
            ModelKind::InverseSquare => vec![estimate::estimate_inverse_parameter(x, y, 2)],
            ModelKind::Gaussian => estimate::estimate_gaussian(x, y),
            ModelKind::Exponential => estimate::estimate_exponential(x, y),
            ModelKind::Logistic => estimate::estimate_logistic(x, y),
            ModelKind::SquarePulse => estimate::estimate_square_pulse(x, y),
        }
    }

    /// Model-specific bounds, for models whose evaluation can overflow.
    pub fn default_bounds(self, x: &[f64]) -> Option<Bounds> {
        match self {
            ModelKind::Sinh | ModelKind::Cosh => Some(estimate::estimate_hyperbolic_bounds(x)),
            _ => None,
        }
    }
}

impl Model for ModelKind {
    fn param_count(&self) -> usize {
        self.parameter_names().len()
    }

    fn eval(&self, x: &[f64], p: &[f64]) -> f64 {
        let v = x[0];
        match self {
            ModelKind::Linear => p[0] * v + p[1],
            ModelKind::LinearOrigin => p[0] * v,
            ModelKind::Quadratic | ModelKind::Cubic | ModelKind::Quartic => {
                p.iter().fold(0.0, |acc, c| acc * v + c)
            }
            ModelKind::SquareOrigin => p[0] * v * v,
            ModelKind::CubeOrigin => p[0] * v * v * v,
            ModelKind::Sin => p[0] * (p[1] * v + p[2]).sin(),
            ModelKind::Cos => p[0] * (p[1] * v + p[2]).cos(),
            ModelKind::Sinh => p[0] * (p[1] * v).sinh(),
            ModelKind::Cosh => p[0] * (p[1] * v).cosh(),
            ModelKind::Ln => p[0] * v.ln(),
            ModelKind::Inverse => p[0] / v,
            ModelKind::InverseSquare => p[0] / (v * v),
            ModelKind::Gaussian => {
                let z = (v - p[1]) / p[2];
                p[0] * (-0.5 * z * z).exp()
            }
            ModelKind::Exponential => p[0] * (p[1] * v).exp(),
            ModelKind::Logistic => p[0] / (1.0 + (-p[1] * (v - p[2])).exp()),
            ModelKind::SquarePulse => {
                if (v - p[1]).abs() <= 0.5 * p[2].abs() {
                    p[0]
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == key)
            .ok_or_else(|| FitError::validation(format!("unknown model '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(kind.param_count(), kind.initial_guess(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]).len());
        }
        assert_eq!("Inverse-Square".parse::<ModelKind>().unwrap(), ModelKind::InverseSquare);
        assert!("spline".parse::<ModelKind>().is_err());
    }

    #[test]
    fn templates_mention_every_parameter() {
        for kind in ModelKind::ALL {
            for name in kind.parameter_names() {
                assert!(
                    kind.template().contains(&format!("{{{name}}}")),
                    "{kind} template misses {name}"
                );
            }
        }
    }

    #[test]
    fn polynomial_eval_uses_highest_degree_first() {
        let y = ModelKind::Quadratic.eval(&[2.0], &[1.0, -3.0, 5.0]);
        assert_eq!(y, 4.0 - 6.0 + 5.0);
    }

    #[test]
    fn square_pulse_is_flat_inside_window() {
        let p = [2.0, 5.0, 2.0];
        assert_eq!(ModelKind::SquarePulse.eval(&[5.9], &p), 2.0);
        assert_eq!(ModelKind::SquarePulse.eval(&[6.5], &p), 0.0);
    }
}
