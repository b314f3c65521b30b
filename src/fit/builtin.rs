//! Built-in model pipeline: estimate → merge overrides → fit → render.

use crate::domain::{ModelFit, SampleSet};
use crate::error::FitError;
use crate::fit::{fit_with_options, merge_bounds, merge_guess, FitOptions};
use crate::models::{EquationRegistry, ModelKind};

/// Per-slot user overrides for guess and bounds. Empty vectors (the default)
/// override nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuessOverrides {
    pub guess: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
}

/// Fit the built-in model `kind`, with parameter names and the display
/// equation taken from `registry`.
pub fn fit_builtin(
    registry: &EquationRegistry,
    samples: &SampleSet,
    kind: ModelKind,
    overrides: &GuessOverrides,
    options: &FitOptions,
) -> Result<ModelFit, FitError> {
    samples.check_shape()?;
    if samples.input_count() != 1 {
        return Err(FitError::validation(format!(
            "built-in model '{kind}' takes one independent variable, got {}",
            samples.input_count()
        )));
    }
    let names = registry
        .parameter_names(kind.name())
        .ok_or_else(|| FitError::validation(format!("'{kind}' is not in the equation registry")))?;

    let x = samples.x_values();
    let computed = kind.initial_guess(x, &samples.y);
    let guess = merge_guess(&computed, Some(overrides.guess.as_slice()));
    let bounds = merge_bounds(
        kind.default_bounds(x).as_ref(),
        Some(overrides.lower.as_slice()),
        Some(overrides.upper.as_slice()),
        guess.len(),
    );
    tracing::debug!(model = %kind, ?guess, "initial guess");

    let result = fit_with_options(samples, &kind, names, Some(guess.as_slice()), Some(&bounds), options)?;
    let equation = registry.render(kind.name(), &result.params)?;
    Ok(ModelFit {
        model: kind.name().to_string(),
        equation,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_pipeline_renders_equation() {
        let registry = EquationRegistry::standard();
        let samples = SampleSet::new([0.0, 1.0, 2.0, 3.0], [1.0, 3.0, 5.0, 7.0]);
        let fit = fit_builtin(
            &registry,
            &samples,
            ModelKind::Linear,
            &GuessOverrides::default(),
            &FitOptions::default(),
        )
        .unwrap();
        assert_eq!(fit.model, "linear");
        assert!((fit.result.param("m").unwrap() - 2.0).abs() < 1e-8);
        assert!((fit.result.param("n").unwrap() - 1.0).abs() < 1e-8);
        assert!(fit.equation.starts_with("y = 2.0000"));
    }

    #[test]
    fn hyperbolic_override_outside_bounds_fails() {
        let registry = EquationRegistry::standard();
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 * (0.3 * v).sinh()).collect();
        let samples = SampleSet::new(x, y);
        let overrides = GuessOverrides {
            guess: vec![None, Some(100.0)],
            ..GuessOverrides::default()
        };
        let err = fit_builtin(&registry, &samples, ModelKind::Sinh, &overrides, &FitOptions::default())
            .unwrap_err();
        assert!(matches!(err, FitError::Fitting(_)));
    }

    #[test]
    fn registry_without_the_model_is_a_validation_error() {
        let samples = SampleSet::new([1.0, 2.0, 3.0], [1.0, 2.0, 3.0]);
        let err = fit_builtin(
            &EquationRegistry::default(),
            &samples,
            ModelKind::Linear,
            &GuessOverrides::default(),
            &FitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }
}
