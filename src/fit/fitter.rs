//! Weighted nonlinear least squares for any [`Model`].
//!
//! Given:
//! - samples `(x_i, y_i)` with optional `uy_i`
//! - a model `f(x; θ)` with named parameters
//! - an initial guess and box bounds
//!
//! we minimize `Σ w_i² (y_i − f(x_i; θ))²` with `w_i = 1/uy_i` (or `1`) using
//! the bounded Levenberg–Marquardt solver, then derive:
//! - the parameter covariance `(JᵀJ)⁻¹`, absolute when `uy` is given and
//!   scaled by `SS_res/ν` otherwise
//! - standard errors and Student-t confidence intervals
//! - `R²`, `RMSE`, `χ²` and `χ²_red`
//!
//! Non-convergence, negative degrees of freedom and a guess outside its
//! bounds are errors rather than results with garbage statistics. A singular
//! covariance (a parameter the data cannot identify) leaves the covariance,
//! standard errors and intervals empty instead of reporting them.

use std::collections::HashSet;

use nalgebra::DMatrix;

use crate::domain::{Bounds, FitResult, FitStatistics, SampleSet, TerminationReason};
use crate::error::FitError;
use crate::math::{levenberg_marquardt, student_t_critical, LmOptions};
use crate::models::Model;

/// Solver and reporting options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Cap on model evaluations (finite-difference Jacobian columns included).
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub initial_lambda: f64,
    /// Two-sided confidence level for parameter intervals.
    pub confidence_level: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        let lm = LmOptions::default();
        Self {
            max_evaluations: lm.max_evaluations,
            ftol: lm.ftol,
            xtol: lm.xtol,
            gtol: lm.gtol,
            initial_lambda: lm.initial_lambda,
            confidence_level: 0.95,
        }
    }
}

impl FitOptions {
    pub fn solver_options(&self) -> LmOptions {
        LmOptions {
            max_evaluations: self.max_evaluations,
            ftol: self.ftol,
            xtol: self.xtol,
            gtol: self.gtol,
            initial_lambda: self.initial_lambda,
            ..LmOptions::default()
        }
    }

    /// Reject settings the solver cannot work with.
    pub fn check(&self) -> Result<(), FitError> {
        if self.max_evaluations == 0 {
            return Err(FitError::validation("max_evaluations must be positive"));
        }
        for (name, v) in [("ftol", self.ftol), ("xtol", self.xtol), ("gtol", self.gtol)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(FitError::validation(format!("{name} must be a non-negative number")));
            }
        }
        if !(self.initial_lambda.is_finite() && self.initial_lambda > 0.0) {
            return Err(FitError::validation("initial_lambda must be positive"));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(FitError::validation("confidence level must lie in (0, 1)"));
        }
        Ok(())
    }
}

/// Fit `model` to `samples` with default options.
///
/// `bounds` default to `(-∞, +∞)` per parameter and `guess` to
/// [`default_start`] within them (all ones when unbounded).
pub fn fit<M, S>(
    samples: &SampleSet,
    model: &M,
    parameter_names: &[S],
    guess: Option<&[f64]>,
    bounds: Option<&Bounds>,
) -> Result<FitResult, FitError>
where
    M: Model + ?Sized,
    S: AsRef<str>,
{
    fit_with_options(samples, model, parameter_names, guess, bounds, &FitOptions::default())
}

/// Fit `model` to `samples`.
pub fn fit_with_options<M, S>(
    samples: &SampleSet,
    model: &M,
    parameter_names: &[S],
    guess: Option<&[f64]>,
    bounds: Option<&Bounds>,
    options: &FitOptions,
) -> Result<FitResult, FitError>
where
    M: Model + ?Sized,
    S: AsRef<str>,
{
    options.check()?;
    samples.check_shape()?;
    let names = check_parameter_names(model, parameter_names)?;
    let p = names.len();

    if model.input_count() != samples.input_count() {
        return Err(FitError::validation(format!(
            "model takes {} independent variable(s), samples have {}",
            model.input_count(),
            samples.input_count()
        )));
    }

    let bounds = match bounds {
        Some(b) => {
            b.check(p)?;
            b.clone()
        }
        None => Bounds::unbounded(p),
    };

    let guess = match guess {
        Some(g) if g.len() != p => {
            return Err(FitError::validation(format!(
                "initial guess has {} values, expected {p}",
                g.len()
            )));
        }
        Some(g) => g.to_vec(),
        None => default_start(&bounds),
    };
    if let Some(k) = guess.iter().position(|v| !v.is_finite()) {
        return Err(FitError::validation(format!(
            "initial guess for '{}' is not finite",
            names[k]
        )));
    }
    if let Some(k) = bounds.first_violation(&guess) {
        return Err(FitError::fitting(format!(
            "initial guess {} = {} lies outside its bounds [{}, {}]",
            names[k], guess[k], bounds.lower[k], bounds.upper[k]
        )));
    }

    let n = samples.len();
    let dof = n as i64 - p as i64;
    if dof < 0 {
        return Err(FitError::fitting(format!(
            "{n} samples cannot determine {p} parameters"
        )));
    }

    let weights = residual_weights(samples)?;
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row = vec![0.0; samples.input_count()];
            samples.fill_row(i, &mut row);
            row
        })
        .collect();

    let outcome = levenberg_marquardt(&guess, &bounds, &options.solver_options(), |theta| {
        rows.iter()
            .zip(samples.y.iter())
            .zip(weights.iter())
            .map(|((row, y), w)| (y - model.eval(row, theta)) * w)
            .collect()
    })?;

    let convergence = outcome.convergence;
    if !convergence.reason.is_converged() {
        return Err(FitError::fitting(format!(
            "optimizer did not converge ({:?} after {} evaluations)",
            convergence.reason, convergence.evaluations
        )));
    }
    if convergence.reason == TerminationReason::Stagnation {
        tracing::warn!(
            iterations = convergence.iterations,
            "fit stopped because no step lowered the objective"
        );
    }

    let params = outcome.x;
    let y_predicted: Vec<f64> = rows.iter().map(|row| model.eval(row, &params)).collect();
    let residuals: Vec<f64> = samples
        .y
        .iter()
        .zip(y_predicted.iter())
        .map(|(y, f)| y - f)
        .collect();
    if residuals.iter().any(|r| !r.is_finite()) {
        return Err(FitError::fitting("model is not finite at the fitted parameters"));
    }

    let statistics = fit_statistics(samples, &residuals, dof);

    let covariance = match (&samples.uy, dof) {
        (Some(_), _) => invert_normal_matrix(&outcome.jacobian),
        (None, 0) => None,
        (None, _) => {
            let scale = statistics.ss_res / dof as f64;
            invert_normal_matrix(&outcome.jacobian).map(|c| c * scale)
        }
    };
    if covariance.is_none() && (samples.uy.is_some() || dof > 0) {
        tracing::warn!("covariance is singular; standard errors and intervals are omitted");
    }
    let std_errors: Option<Vec<f64>> = covariance
        .as_ref()
        .map(|c| (0..p).map(|k| c[(k, k)].max(0.0).sqrt()).collect());
    let confidence_intervals = match (&std_errors, dof) {
        (Some(se), dof) if dof > 0 => {
            let t = student_t_critical(options.confidence_level, dof as u64).ok_or_else(|| {
                FitError::fitting("could not evaluate the Student-t critical value")
            })?;
            Some(
                params
                    .iter()
                    .zip(se.iter())
                    .map(|(v, s)| (v - t * s, v + t * s))
                    .collect(),
            )
        }
        _ => None,
    };

    tracing::info!(
        n,
        parameters = p,
        r_squared = statistics.r_squared,
        rmse = statistics.rmse,
        evaluations = convergence.evaluations,
        "fit converged"
    );

    Ok(FitResult {
        parameter_names: names,
        params,
        covariance,
        std_errors,
        confidence_intervals,
        confidence_level: options.confidence_level,
        statistics,
        y_predicted,
        residuals,
        convergence,
    })
}

/// Starting point used when the caller gives no guess: inside every box.
///
/// Per parameter: the midpoint of a finite box, one step inside a half-open
/// one, and `1` when unbounded.
pub fn default_start(bounds: &Bounds) -> Vec<f64> {
    bounds
        .lower
        .iter()
        .zip(bounds.upper.iter())
        .map(|(&lo, &hi)| match (lo.is_finite(), hi.is_finite()) {
            (true, true) => 0.5 * (lo + hi),
            (true, false) => lo + 1.0,
            (false, true) => hi - 1.0,
            (false, false) => 1.0,
        })
        .collect()
}

fn check_parameter_names<M, S>(model: &M, names: &[S]) -> Result<Vec<String>, FitError>
where
    M: Model + ?Sized,
    S: AsRef<str>,
{
    if names.is_empty() {
        return Err(FitError::validation("at least one parameter is required"));
    }
    if names.len() != model.param_count() {
        return Err(FitError::validation(format!(
            "{} parameter names given, model takes {}",
            names.len(),
            model.param_count()
        )));
    }
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_ref()) {
            return Err(FitError::validation(format!(
                "duplicate parameter name '{}'",
                name.as_ref()
            )));
        }
    }
    Ok(names.iter().map(|s| s.as_ref().to_string()).collect())
}

/// `1/uy_i`, or ones for an unweighted fit.
fn residual_weights(samples: &SampleSet) -> Result<Vec<f64>, FitError> {
    match &samples.uy {
        None => Ok(vec![1.0; samples.len()]),
        Some(uy) => uy
            .iter()
            .enumerate()
            .map(|(i, u)| {
                if u.is_finite() && *u > 0.0 {
                    Ok(1.0 / u)
                } else {
                    Err(FitError::fitting(format!(
                        "uncertainty uy[{i}] = {u} cannot be used as a weight"
                    )))
                }
            })
            .collect(),
    }
}

/// `(JᵀJ)⁻¹`, or `None` when it is singular or not finite.
fn invert_normal_matrix(jacobian: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let normal = jacobian.transpose() * jacobian;
    let inverse = match normal.clone().cholesky() {
        Some(chol) => Some(chol.inverse()),
        None => normal.try_inverse(),
    };
    inverse.filter(|m| m.iter().all(|v| v.is_finite()) && (0..m.nrows()).all(|k| m[(k, k)] >= 0.0))
}

fn fit_statistics(samples: &SampleSet, residuals: &[f64], dof: i64) -> FitStatistics {
    let n = samples.len();
    let y_mean = samples.y.iter().sum::<f64>() / n as f64;
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let ss_tot: f64 = samples.y.iter().map(|y| (y - y_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
    let rmse = (ss_res / n as f64).sqrt();

    let chi_squared = samples.uy.as_ref().map(|uy| {
        residuals
            .iter()
            .zip(uy.iter())
            .map(|(r, u)| (r / u).powi(2))
            .sum::<f64>()
    });
    let reduced_chi_squared = chi_squared.filter(|_| dof > 0).map(|c| c / dof as f64);

    FitStatistics {
        n,
        dof,
        ss_res,
        ss_tot,
        r_squared,
        rmse,
        chi_squared,
        reduced_chi_squared,
    }
}
