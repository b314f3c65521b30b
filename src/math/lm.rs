//! Bounded Levenberg–Marquardt solver for nonlinear least squares.
//!
//! Minimizes `½ Σ r_i(θ)²` for a residual function supplied by the caller.
//!
//! References:
//! - Levenberg (1944), Marquardt (1963).
//! - Moré (1978), "The Levenberg-Marquardt algorithm: implementation and theory".
//!
//! Implementation notes:
//! - The Jacobian is built by forward differences (MINPACK step rule
//!   `h = √ε·|θ|`), stepping backwards when the forward point would leave the
//!   box.
//! - Damping uses Marquardt's diagonal scaling `JᵀJ + λ·diag(JᵀJ)`, so the
//!   iteration is invariant to parameter units.
//! - Bounds are enforced by projecting trial points onto the box.
//! - A step is accepted only if it strictly lowers the objective. The
//!   relative-reduction and step-size tests are only trusted when the step was
//!   close to a Gauss–Newton step (`λ ≤ 1`); a heavily damped step is small
//!   for reasons unrelated to convergence.
//! - When no damping level yields a decrease the solver stops with
//!   [`TerminationReason::Stagnation`], which counts as converged: the
//!   objective cannot be lowered further at machine precision.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Bounds, ConvergenceInfo, TerminationReason};
use crate::error::FitError;

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    /// Hard cap on residual function evaluations (Jacobian columns included).
    pub max_evaluations: usize,
    /// Relative reduction of the objective below which we stop.
    pub ftol: f64,
    /// Relative step size below which we stop.
    pub xtol: f64,
    /// Max-norm of the gradient below which we stop.
    pub gtol: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    /// Consecutive rejected steps before declaring stagnation.
    pub max_stagnation: usize,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.3,
            max_stagnation: 40,
        }
    }
}

/// Final state of a solver run.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub x: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Residual Jacobian at `x` (`m × n`).
    pub jacobian: DMatrix<f64>,
    pub convergence: ConvergenceInfo,
}

const LAMBDA_MAX: f64 = 1e20;
const LAMBDA_MIN: f64 = 1e-15;

#[inline]
fn objective(residuals: &[f64]) -> f64 {
    0.5 * residuals.iter().map(|r| r * r).sum::<f64>()
}

fn finite_difference_jacobian<F>(
    x: &[f64],
    base_residuals: &[f64],
    bounds: &Bounds,
    residual_fn: &mut F,
    evaluations: &mut usize,
) -> DMatrix<f64>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    let m = base_residuals.len();
    let n = x.len();
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut j = DMatrix::zeros(m, n);

    let mut xp = x.to_vec();
    for c in 0..n {
        let mut h = sqrt_eps * x[c].abs();
        if h == 0.0 {
            h = sqrt_eps;
        }
        if x[c] + h > bounds.upper[c] {
            h = -h;
        }
        xp[c] = x[c] + h;
        let denom = xp[c] - x[c];

        if denom != 0.0 {
            let rp = residual_fn(&xp);
            *evaluations += 1;
            for r in 0..m {
                j[(r, c)] = (rp[r] - base_residuals[r]) / denom;
            }
        }
        xp[c] = x[c];
    }

    j
}

/// Minimize `½‖r(θ)‖²` from `initial` within `bounds`.
///
/// Errors only when the objective is not finite at the starting point; a run
/// that hits the evaluation cap or a numerical failure is reported through
/// [`ConvergenceInfo::reason`] so the caller can decide.
pub fn levenberg_marquardt<F>(
    initial: &[f64],
    bounds: &Bounds,
    options: &LmOptions,
    mut residual_fn: F,
) -> Result<LmOutcome, FitError>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    let n = initial.len();
    if bounds.len() != n {
        return Err(FitError::validation(
            "initial vector dimension does not match bounds",
        ));
    }

    let mut x = bounds.clamp(initial);
    let mut evaluations = 0usize;
    let mut residuals = residual_fn(&x);
    evaluations += 1;
    if residuals.is_empty() {
        return Err(FitError::fitting("residual function returned no values"));
    }

    let mut obj = objective(&residuals);
    if !obj.is_finite() {
        return Err(FitError::fitting(
            "model is not finite at the initial guess",
        ));
    }

    let mut lambda = options.initial_lambda.max(LAMBDA_MIN);
    let mut iterations = 0usize;
    let mut reason = TerminationReason::MaxEvaluations;

    'outer: while evaluations < options.max_evaluations {
        if obj == 0.0 {
            reason = TerminationReason::ExactFit;
            break;
        }
        iterations += 1;

        let jacobian =
            finite_difference_jacobian(&x, &residuals, bounds, &mut residual_fn, &mut evaluations);
        let jt = jacobian.transpose();
        let a = &jt * &jacobian;
        let g = &jt * DVector::from_column_slice(&residuals);

        let g_norm = g.amax();
        if !g_norm.is_finite() {
            reason = TerminationReason::NumericalFailure;
            break;
        }
        if g_norm <= options.gtol {
            reason = TerminationReason::GradientTolerance;
            break;
        }

        let max_diag = (0..n).map(|i| a[(i, i)]).fold(0.0_f64, f64::max);
        let diag_floor = (max_diag * 1e-12).max(f64::MIN_POSITIVE);
        let x_norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();

        let mut rejected = 0usize;
        loop {
            if evaluations >= options.max_evaluations {
                reason = TerminationReason::MaxEvaluations;
                break 'outer;
            }

            let mut damped = a.clone();
            for i in 0..n {
                damped[(i, i)] += lambda * a[(i, i)].max(diag_floor);
            }
            let rhs = -&g;
            let delta = match damped.clone().cholesky() {
                Some(chol) => Some(chol.solve(&rhs)),
                None => damped.lu().solve(&rhs),
            };

            let Some(delta) = delta.filter(|d| d.iter().all(|v| v.is_finite())) else {
                lambda = (lambda * options.lambda_up).min(LAMBDA_MAX);
                rejected += 1;
                if rejected >= options.max_stagnation || lambda >= LAMBDA_MAX {
                    reason = TerminationReason::Stagnation;
                    break 'outer;
                }
                continue;
            };

            let mut candidate: Vec<f64> = x.iter().zip(delta.iter()).map(|(v, d)| v + d).collect();
            candidate = bounds.clamp(&candidate);
            let step_norm = candidate
                .iter()
                .zip(x.iter())
                .map(|(c, v)| (c - v) * (c - v))
                .sum::<f64>()
                .sqrt();
            if step_norm == 0.0 {
                // The projected step is pinned against the box.
                reason = TerminationReason::StepTolerance;
                break 'outer;
            }

            let candidate_residuals = residual_fn(&candidate);
            evaluations += 1;
            let candidate_obj = objective(&candidate_residuals);

            if candidate_obj.is_finite() && candidate_obj < obj {
                let reduction = (obj - candidate_obj) / obj;
                let trusted = lambda <= 1.0;
                x = candidate;
                residuals = candidate_residuals;
                obj = candidate_obj;
                lambda = (lambda * options.lambda_down).max(LAMBDA_MIN);

                if obj == 0.0 {
                    reason = TerminationReason::ExactFit;
                    break 'outer;
                }
                if trusted && reduction <= options.ftol {
                    reason = TerminationReason::ObjectiveTolerance;
                    break 'outer;
                }
                if trusted && step_norm <= options.xtol * (x_norm + options.xtol) {
                    reason = TerminationReason::StepTolerance;
                    break 'outer;
                }
                break;
            }

            lambda = (lambda * options.lambda_up).min(LAMBDA_MAX);
            rejected += 1;
            if rejected >= options.max_stagnation || lambda >= LAMBDA_MAX {
                reason = TerminationReason::Stagnation;
                break 'outer;
            }
        }
    }

    tracing::debug!(
        iterations,
        evaluations,
        objective = obj,
        ?reason,
        "levenberg-marquardt finished"
    );

    let jacobian =
        finite_difference_jacobian(&x, &residuals, bounds, &mut residual_fn, &mut evaluations);

    Ok(LmOutcome {
        x,
        residuals,
        jacobian,
        convergence: ConvergenceInfo {
            iterations,
            evaluations,
            reason,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lm_respects_bounds_and_fits_linear_residual() {
        let bounds = Bounds::new(vec![-5.0, -5.0], vec![5.0, 5.0]);
        let out = levenberg_marquardt(&[4.0, -4.0], &bounds, &LmOptions::default(), |x| {
            vec![x[0] - 1.5, x[1] + 2.0]
        })
        .unwrap();

        assert!(out.convergence.reason.is_converged());
        assert!((out.x[0] - 1.5).abs() < 1e-6);
        assert!((out.x[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn lm_stops_at_active_bound() {
        let bounds = Bounds::new(vec![2.0], vec![10.0]);
        let out = levenberg_marquardt(&[5.0], &bounds, &LmOptions::default(), |x| vec![x[0] - 1.0])
            .unwrap();
        assert!(out.convergence.reason.is_converged());
        assert!((out.x[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn lm_fits_exponential_decay() {
        let t: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = t.iter().map(|v| 3.0 * (-0.7 * v).exp()).collect();
        let bounds = Bounds::unbounded(2);
        let out = levenberg_marquardt(&[1.0, -0.1], &bounds, &LmOptions::default(), |p| {
            t.iter()
                .zip(y.iter())
                .map(|(ti, yi)| yi - p[0] * (p[1] * ti).exp())
                .collect()
        })
        .unwrap();
        assert!(out.convergence.reason.is_converged(), "{:?}", out.convergence);
        assert!((out.x[0] - 3.0).abs() < 1e-6);
        assert!((out.x[1] + 0.7).abs() < 1e-6);
    }

    #[test]
    fn lm_reports_evaluation_cap() {
        let options = LmOptions {
            max_evaluations: 3,
            ..LmOptions::default()
        };
        let out = levenberg_marquardt(&[10.0, 10.0], &Bounds::unbounded(2), &options, |x| {
            vec![10.0 * (x[1] - x[0] * x[0]), 1.0 - x[0]]
        })
        .unwrap();
        assert_eq!(out.convergence.reason, TerminationReason::MaxEvaluations);
    }

    #[test]
    fn lm_rejects_non_finite_start() {
        let err = levenberg_marquardt(&[0.0], &Bounds::unbounded(1), &LmOptions::default(), |x| {
            vec![1.0 / x[0]]
        })
        .unwrap_err();
        assert!(matches!(err, FitError::Fitting(_)));
    }
}
