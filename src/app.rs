//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs the log subscriber
//! - resolves solver options (defaults, then environment, then flags)
//! - builds the sample set and runs the requested fit
//! - prints the text report or JSON

use clap::Parser;

use crate::cli::{Cli, Command, FitArgs, FormulaArgs, OutputArgs};
use crate::domain::{FitResult, SampleSet};
use crate::error::AppError;
use crate::fit::{fit_builtin, FitOptions, GuessOverrides};
use crate::formula::FormulaModel;
use crate::models::{EquationRegistry, ModelKind};
use crate::report::{format_fit_summary, format_model_fit, format_residual_table, largest_residuals, residual_rows};

/// Entry point for the `cfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = EquationRegistry::standard();
    match cli.command {
        Command::Fit(args) => handle_fit(&registry, args),
        Command::Formula(args) => handle_formula(args),
        Command::Models => {
            println!("{}", format_model_list(&registry));
            Ok(())
        }
    }
}

fn handle_fit(registry: &EquationRegistry, args: FitArgs) -> Result<(), AppError> {
    let options = fit_options(&args.output)?;
    let mut samples = SampleSet::new(args.x, args.output.y.iter().copied());
    if let Some(uy) = &args.output.uy {
        samples = samples.with_uy(uy.iter().copied());
    }
    let overrides = GuessOverrides {
        guess: args.guess.map(|s| s.0).unwrap_or_default(),
        lower: args.lower.map(|s| s.0).unwrap_or_default(),
        upper: args.upper.map(|s| s.0).unwrap_or_default(),
    };

    let fit = fit_builtin(registry, &samples, args.model, &overrides, &options)?;
    if args.output.json {
        print_json(&fit)?;
    } else {
        println!("{}", format_model_fit(&fit));
        print_residuals(&samples, &fit.result, args.output.residuals);
    }
    Ok(())
}

fn handle_formula(args: FormulaArgs) -> Result<(), AppError> {
    let options = fit_options(&args.output)?;
    let variables: Vec<&str> = args.vars.iter().map(|c| c.name.as_str()).collect();
    let model = FormulaModel::with_variables(&args.expression, args.params.as_slice(), variables.as_slice())?;

    let samples = formula_samples(&args);
    let result = model.fit_samples(&samples, args.guess.as_deref(), None, &options)?;
    if args.output.json {
        print_json(&result)?;
    } else {
        println!("{}", format_fit_summary(model.expression(), None, &result));
        print_residuals(&samples, &result, args.output.residuals);
    }
    Ok(())
}

/// One `x` column per `--var`, in order, with `--y` (and `--uy`) as the
/// dependent values. Variables are never looked up by name here, so any
/// identifier is a valid variable name.
fn formula_samples(args: &FormulaArgs) -> SampleSet {
    let columns = args.vars.iter().map(|c| c.values.clone()).collect();
    let samples = SampleSet::from_columns(columns, args.output.y.iter().copied());
    match &args.output.uy {
        Some(uy) => samples.with_uy(uy.iter().copied()),
        None => samples,
    }
}

/// Defaults, then `CURVEFIT_*` environment variables, then flags.
fn fit_options(output: &OutputArgs) -> Result<FitOptions, AppError> {
    let mut options = FitOptions::from_env()?;
    if let Some(n) = output.max_evaluations {
        options.max_evaluations = n;
    }
    if let Some(level) = output.confidence {
        options.confidence_level = level;
    }
    options.check()?;
    Ok(options)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(1, format!("Failed to serialize result: {e}")))?;
    println!("{text}");
    Ok(())
}

fn print_residuals(samples: &SampleSet, result: &FitResult, top_n: Option<usize>) {
    if let Some(n) = top_n {
        let rows = largest_residuals(&residual_rows(samples, result), n);
        println!("Largest residuals:\n{}", format_residual_table(&rows));
    }
}

/// One line per built-in model: name, parameters, equation template.
pub fn format_model_list(registry: &EquationRegistry) -> String {
    let mut out = String::new();
    for kind in ModelKind::ALL {
        let Some(entry) = registry.get(kind.name()) else {
            continue;
        };
        out.push_str(&format!(
            "{:<16} [{}]  {}\n",
            kind.name(),
            entry.parameter_names.join(", "),
            entry.template
        ));
    }
    out
}
