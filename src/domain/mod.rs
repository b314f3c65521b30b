//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - fit inputs (`SampleSet`, `DataTable`, `Bounds`)
//! - fit outputs (`FitResult`, `FitStatistics`, `ParameterEstimate`, `ModelFit`)
//! - optimizer bookkeeping (`ConvergenceInfo`, `TerminationReason`)

pub mod types;

pub use types::*;
