//! Models: the `Model` trait, the closed set of built-in families, and the
//! equation registry used for display.
//!
//! Models are small, pure functions so that the fitter can stay generic.

pub mod builtin;
pub mod model;
pub mod registry;

pub use builtin::*;
pub use model::*;
pub use registry::*;
