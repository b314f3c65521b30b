//! `curvefit` library crate.
//!
//! The binary (`cfit`) is a thin wrapper around this library so that:
//!
//! - the fitting engine is testable without spawning processes
//! - estimators, the merger, the formula evaluator and the fitter are
//!   reusable on their own (GUI front ends, batch runners, notebooks)
//! - code stays easy to navigate as the project grows
//!
//! Control flow for a built-in model:
//!
//! ```text
//! ModelKind ─▶ estimate::* ─▶ fit::merge_* ─▶ fit::fit ─▶ FitResult
//!                                (overrides)      ▲
//! FormulaModel ───────────────────────────────────┘
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod fit;
pub mod formula;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{Bounds, DataTable, FitResult, ModelFit, SampleSet};
pub use error::FitError;
pub use fit::{fit, fit_builtin, fit_with_options, merge_bounds, merge_guess, FitOptions, GuessOverrides};
pub use formula::FormulaModel;
pub use models::{EquationRegistry, Model, ModelKind};
