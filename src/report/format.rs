//! Formatted terminal output for fit results.
//!
//! Formatting lives here so the fitting code stays free of presentation and
//! output changes stay localized.

use crate::domain::{FitResult, ModelFit};
use crate::report::ResidualRow;

/// Summary of a built-in model fit, including its rendered equation.
pub fn format_model_fit(fit: &ModelFit) -> String {
    format_fit_summary(&fit.model, Some(fit.equation.as_str()), &fit.result)
}

/// Parameters ± standard errors, confidence intervals and goodness of fit.
pub fn format_fit_summary(title: &str, equation: Option<&str>, result: &FitResult) -> String {
    let mut out = String::new();
    let stats = &result.statistics;

    out.push_str(&format!("=== cfit - {title} ===\n"));
    if let Some(equation) = equation {
        out.push_str(&format!("Equation: {equation}\n"));
    }
    out.push_str(&format!(
        "Converged: {:?} after {} iterations ({} evaluations)\n",
        result.convergence.reason, result.convergence.iterations, result.convergence.evaluations
    ));

    let ci_label = format!("{:.0}% CI", result.confidence_level * 100.0);
    out.push_str("\nParameters:\n");
    out.push_str(
        format!("{:<12} {:>14} {:>14}  {}\n", "name", "value", "std err", ci_label).trim_end(),
    );
    out.push('\n');
    for p in result.parameters() {
        let ci = p
            .confidence_interval
            .map(|(lo, hi)| format!("[{lo:.6}, {hi:.6}]"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<12} {:>14.6} {:>14}  {ci}\n",
            truncate(&p.name, 12),
            p.value,
            fmt_opt(p.std_error),
        ));
    }

    out.push_str("\nStatistics:\n");
    out.push_str(&format!("- n={} dof={}\n", stats.n, stats.dof));
    out.push_str(&format!("- R²={:.6} RMSE={:.6}\n", stats.r_squared, stats.rmse));
    if let Some(chi2) = stats.chi_squared {
        out.push_str(&format!(
            "- χ²={chi2:.6} χ²_red={}\n",
            fmt_opt(stats.reduced_chi_squared)
        ));
    }
    out
}

/// Table of observations, fitted values and residuals.
pub fn format_residual_table(rows: &[ResidualRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!("{:>6} {:>12} {:>12} {:>12} {:>12}", "#", "x", "y_obs", "y_fit", "residual").trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<6} {:-<12} {:-<12} {:-<12} {:-<12}\n", "", "", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:>6} {:>12.4} {:>12.4} {:>12.4} {:>12.4}\n",
            r.index, r.x, r.y_obs, r.y_fit, r.residual
        ));
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.6}")).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
