//! Numerical building blocks: linear and nonlinear least squares, robust
//! statistics, and period detection.

pub mod lm;
pub mod ols;
pub mod signal;
pub mod stats;

pub use lm::*;
pub use ols::*;
pub use signal::*;
pub use stats::*;
