//! User-defined formula models.
//!
//! A formula such as `"A*exp(-(x - mu)^2 / (2*sigma^2))"` is lexed, parsed
//! into an AST and compiled against a closed scope: the declared parameters,
//! the declared independent variables, `pi`, `e`, and a fixed table of math
//! functions. The compiled tree holds only slot indices, so evaluation cannot
//! reach anything else.
//!
//! Structural problems surface at construction (`Validation` for the name
//! lists, `Equation` for the expression). Numeric problems such as a division
//! by zero surface at fit time.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

use std::collections::HashSet;

pub use ast::{Function, Node};
pub use error::{FormulaError, Span};

use crate::domain::{Bounds, DataTable, FitResult, SampleSet};
use crate::error::FitError;
use crate::fit::{default_start, fit_with_options, FitOptions};
use crate::models::Model;

/// Independent variable name used by [`FormulaModel::new`].
pub const DEFAULT_VARIABLE: &str = "x";

/// A compiled formula usable anywhere a [`Model`] is.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaModel {
    expression: String,
    parameter_names: Vec<String>,
    variables: Vec<String>,
    root: Node,
}

impl FormulaModel {
    /// Formula in the single independent variable `x`.
    pub fn new<S: AsRef<str>>(expression: &str, parameter_names: &[S]) -> Result<Self, FitError> {
        Self::with_variables(expression, parameter_names, &[DEFAULT_VARIABLE])
    }

    /// Formula over the named independent variables, in column order.
    pub fn with_variables<S, V>(
        expression: &str,
        parameter_names: &[S],
        variables: &[V],
    ) -> Result<Self, FitError>
    where
        S: AsRef<str>,
        V: AsRef<str>,
    {
        let parameter_names: Vec<String> = parameter_names.iter().map(|s| s.as_ref().to_string()).collect();
        let variables: Vec<String> = variables.iter().map(|s| s.as_ref().to_string()).collect();
        check_names(&parameter_names, &variables)?;

        let tokens = lexer::tokenize(expression)?;
        let expr = parser::parse(tokens, expression.len())?;
        let root = ast::compile(
            &expr,
            &ast::Scope {
                params: &parameter_names,
                variables: &variables,
            },
        )?;
        tracing::debug!(expression, "formula compiled");

        Ok(Self {
            expression: expression.to_string(),
            parameter_names,
            variables,
            root,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// An owned closure `(x_row, θ) → ŷ` independent of `self`.
    pub fn as_callable(&self) -> impl Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static {
        let root = self.root.clone();
        move |x: &[f64], params: &[f64]| root.eval(x, params)
    }

    /// Fit against named columns of `table`; `independent` maps positionally
    /// onto the formula's variables.
    pub fn fit(&self, table: &DataTable, independent: &[&str], dependent: &str) -> Result<FitResult, FitError> {
        let samples = table.samples(independent, dependent)?;
        self.fit_samples(&samples, None, None, &FitOptions::default())
    }

    /// Fit with an explicit starting point and bounds.
    pub fn fit_with_guess(
        &self,
        table: &DataTable,
        independent: &[&str],
        dependent: &str,
        guess: Option<&[f64]>,
        bounds: Option<&Bounds>,
    ) -> Result<FitResult, FitError> {
        let samples = table.samples(independent, dependent)?;
        self.fit_samples(&samples, guess, bounds, &FitOptions::default())
    }

    /// Fit against a prepared sample set.
    ///
    /// Without a guess the fit starts from [`default_start`] inside `bounds`.
    /// The formula is evaluated once at the starting point first; a
    /// non-finite value there is an `Equation` error naming the row.
    pub fn fit_samples(
        &self,
        samples: &SampleSet,
        guess: Option<&[f64]>,
        bounds: Option<&Bounds>,
        options: &FitOptions,
    ) -> Result<FitResult, FitError> {
        samples.check_shape()?;
        if samples.input_count() != self.variables.len() {
            return Err(FitError::validation(format!(
                "formula has {} independent variable(s), data has {}",
                self.variables.len(),
                samples.input_count()
            )));
        }

        let start = match guess {
            Some(g) if g.len() == self.parameter_names.len() => g.to_vec(),
            // Length mismatches are reported by the fitter.
            Some(_) => {
                return fit_with_options(samples, self, self.parameter_names.as_slice(), guess, bounds, options);
            }
            None => match bounds {
                Some(b) if b.len() == self.parameter_names.len() => default_start(b),
                _ => vec![1.0; self.parameter_names.len()],
            },
        };
        let predicted = self.predict(samples, &start);
        if let Some(row) = predicted.iter().position(|v| !v.is_finite()) {
            return Err(FitError::equation(format!(
                "'{}' evaluates to {} at row {row} with the initial parameters",
                self.expression, predicted[row]
            )));
        }

        fit_with_options(samples, self, self.parameter_names.as_slice(), Some(start.as_slice()), bounds, options)
    }
}

impl Model for FormulaModel {
    fn param_count(&self) -> usize {
        self.parameter_names.len()
    }

    fn input_count(&self) -> usize {
        self.variables.len()
    }

    fn eval(&self, x: &[f64], params: &[f64]) -> f64 {
        self.root.eval(x, params)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_names(params: &[String], variables: &[String]) -> Result<(), FitError> {
    if params.is_empty() {
        return Err(FitError::validation("a formula needs at least one parameter"));
    }
    if variables.is_empty() {
        return Err(FitError::validation("a formula needs at least one independent variable"));
    }

    let mut seen = HashSet::new();
    for name in variables {
        if !is_identifier(name) {
            return Err(FitError::validation(format!("'{name}' is not a valid variable name")));
        }
        if Function::lookup(name).is_some() {
            return Err(FitError::validation(format!("variable '{name}' clashes with a function")));
        }
        if !seen.insert(name.as_str()) {
            return Err(FitError::validation(format!("duplicate variable '{name}'")));
        }
    }

    let mut params_seen = HashSet::new();
    for name in params {
        if !is_identifier(name) {
            return Err(FitError::validation(format!("'{name}' is not a valid parameter name")));
        }
        if Function::lookup(name).is_some() {
            return Err(FitError::validation(format!("parameter '{name}' clashes with a function")));
        }
        if variables.contains(name) {
            return Err(FitError::validation(format!(
                "parameter '{name}' clashes with an independent variable"
            )));
        }
        if !params_seen.insert(name.as_str()) {
            return Err(FitError::validation(format!("duplicate parameter '{name}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_with_functions_and_constants() {
        let f = FormulaModel::new("a*sin(pi*x/2) + log(e)*b", &["a", "b"]).unwrap();
        assert!((f.eval(&[1.0], &[2.0, 3.0]) - 5.0).abs() < 1e-12);
        let call = f.as_callable();
        assert!((call(&[1.0], &[2.0, 3.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn name_lists_are_validated() {
        let empty: [&str; 0] = [];
        assert!(matches!(FormulaModel::new("x", &empty), Err(FitError::Validation(_))));
        assert!(matches!(FormulaModel::new("a*x", &["a", "a"]), Err(FitError::Validation(_))));
        assert!(matches!(FormulaModel::new("a*x", &["x"]), Err(FitError::Validation(_))));
        assert!(matches!(FormulaModel::new("a*x", &["2a"]), Err(FitError::Validation(_))));
        assert!(matches!(FormulaModel::new("a*x", &["sin"]), Err(FitError::Validation(_))));
    }

    #[test]
    fn unknown_names_are_equation_errors() {
        for expr in ["a*y", "system(a)", "__import__(a)", "a*x +", "a.real", "sin"] {
            assert!(
                matches!(FormulaModel::new(expr, &["a"]), Err(FitError::Equation(_))),
                "{expr} should be rejected"
            );
        }
    }

    #[test]
    fn over_nested_formulas_are_equation_errors() {
        for depth in [600, 200_000] {
            let expr = format!("{}a*x{}", "(".repeat(depth), ")".repeat(depth));
            assert!(matches!(FormulaModel::new(&expr, &["a"]), Err(FitError::Equation(_))));
        }
        let chain = vec!["a*x"; 50_000].join(" + ");
        assert!(matches!(FormulaModel::new(&chain, &["a"]), Err(FitError::Equation(_))));
    }

    #[test]
    fn division_by_zero_fails_at_fit_time() {
        let f = FormulaModel::new("a/x", &["a"]).unwrap();
        let table = DataTable::new()
            .with_column("x", [0.0, 1.0, 2.0])
            .with_column("y", [1.0, 2.0, 3.0]);
        assert!(matches!(f.fit(&table, &["x"], "y"), Err(FitError::Equation(_))));
    }

    #[test]
    fn parameter_named_e_shadows_the_constant() {
        let f = FormulaModel::new("e*x", &["e"]).unwrap();
        assert_eq!(f.eval(&[2.0], &[3.0]), 6.0);
    }
}
