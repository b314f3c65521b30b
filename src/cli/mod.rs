//! Command-line parsing for the `cfit` curve fitter.
//!
//! Argument parsing and command dispatch stay separate from the fitting code.
//! Data is passed inline as comma-separated values; reading files is left to
//! the caller's shell.

use clap::{Args, Parser, Subcommand};

use crate::models::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cfit", version, about = "Curve fitter for built-in models and user formulas")]
pub struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a built-in model (see `cfit models`).
    Fit(FitArgs),
    /// Fit a user formula such as "a*exp(-b*x) + c".
    Formula(FormulaArgs),
    /// List the built-in models with their parameters and equations.
    Models,
}

/// Options shared by every fitting command.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Dependent values, comma separated.
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub y: Vec<f64>,

    /// Uncertainties of `y`; enables weighted fitting and χ².
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub uy: Option<Vec<f64>>,

    /// Override the evaluation cap (default from CURVEFIT_MAX_EVALUATIONS or 10000).
    #[arg(long)]
    pub max_evaluations: Option<usize>,

    /// Confidence level for parameter intervals (default 0.95).
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Print the result as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Also print the `N` largest residuals.
    #[arg(long, value_name = "N")]
    pub residuals: Option<usize>,
}

/// Fit a built-in model.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Model name, e.g. linear, gaussian, inverse_square.
    #[arg(value_parser = parse_model)]
    pub model: ModelKind,

    /// Independent values, comma separated.
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub x: Vec<f64>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Initial guess overrides; `_` keeps the estimated value (e.g. `2,_,0.5`).
    #[arg(long, value_parser = parse_slots, allow_hyphen_values = true)]
    pub guess: Option<SlotList>,

    /// Lower bound overrides, same syntax as --guess.
    #[arg(long, value_parser = parse_slots, allow_hyphen_values = true)]
    pub lower: Option<SlotList>,

    /// Upper bound overrides, same syntax as --guess.
    #[arg(long, value_parser = parse_slots, allow_hyphen_values = true)]
    pub upper: Option<SlotList>,
}

/// Fit a formula.
#[derive(Debug, Args, Clone)]
pub struct FormulaArgs {
    /// Expression in the independent variables and parameters.
    pub expression: String,

    /// Parameter names in positional order, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub params: Vec<String>,

    /// Independent variable as `name=v1,v2,...`; repeat for several.
    #[arg(long = "var", value_parser = parse_column, required = true, allow_hyphen_values = true)]
    pub vars: Vec<NamedColumn>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Initial guess (all ones when omitted), comma separated.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub guess: Option<Vec<f64>>,
}

/// Per-slot override list; `None` keeps the computed value.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotList(pub Vec<Option<f64>>);

/// `name=v1,v2,...`
#[derive(Debug, Clone, PartialEq)]
pub struct NamedColumn {
    pub name: String,
    pub values: Vec<f64>,
}

fn parse_model(s: &str) -> Result<ModelKind, String> {
    s.parse::<ModelKind>().map_err(|e| e.to_string())
}

fn parse_slots(s: &str) -> Result<SlotList, String> {
    s.split(',')
        .map(|part| match part.trim() {
            "" | "_" => Ok(None),
            v => v
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("'{v}' is not a number or '_'")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(SlotList)
}

fn parse_column(s: &str) -> Result<NamedColumn, String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=v1,v2,... but got '{s}'"))?;
    let values = values
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' in column '{name}' is not a number", v.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(NamedColumn {
        name: name.trim().to_string(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_accept_placeholders() {
        assert_eq!(parse_slots("1,_,-2.5").unwrap(), SlotList(vec![Some(1.0), None, Some(-2.5)]));
        assert_eq!(parse_slots(",3").unwrap(), SlotList(vec![None, Some(3.0)]));
        assert!(parse_slots("a").is_err());
    }

    #[test]
    fn columns_need_a_name() {
        let c = parse_column("t=0,1.5,-2").unwrap();
        assert_eq!(c.name, "t");
        assert_eq!(c.values, vec![0.0, 1.5, -2.0]);
        assert!(parse_column("0,1").is_err());
        assert!(parse_column("t=0,x").is_err());
    }

    #[test]
    fn parses_fit_command() {
        let cli = Cli::try_parse_from([
            "cfit", "fit", "linear-origin", "--x", "1,2,3", "--y", "-3,-6,-9", "--guess", "_", "--json",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.model, ModelKind::LinearOrigin);
        assert_eq!(args.output.y, vec![-3.0, -6.0, -9.0]);
        assert!(args.output.json);
        assert_eq!(cli.log_level, tracing::Level::WARN);
    }

    #[test]
    fn parses_formula_command() {
        let cli = Cli::try_parse_from([
            "cfit", "--log-level", "debug", "formula", "a*x + b*t", "--params", "a,b", "--var", "x=1,2,3",
            "--var", "t=0,1,0", "--y", "1,3,3",
        ])
        .unwrap();
        let Command::Formula(args) = cli.command else {
            panic!("expected formula");
        };
        assert_eq!(args.params, vec!["a", "b"]);
        assert_eq!(args.vars.len(), 2);
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
    }
}
