//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - merge computed guesses and bounds with user overrides
//! - run weighted nonlinear least squares for any model
//! - derive covariance, confidence intervals and goodness-of-fit statistics
//! - drive the built-in models end to end

pub mod builtin;
pub mod fitter;
pub mod merge;

pub use builtin::*;
pub use fitter::*;
pub use merge::*;
