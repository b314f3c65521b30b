//! Error types.
//!
//! The library reports every failure through [`FitError`]. The three variants
//! map to the three things a caller can do about a failure:
//!
//! - `Fitting`: pick a different model or initial guess and try again
//! - `Equation`: fix the formula text
//! - `Validation`: fix the parameter list / option values
//!
//! The `cfit` binary wraps these into [`AppError`], which additionally carries
//! the process exit code.

/// Errors produced by the fitting engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Optimizer non-convergence, degenerate degrees of freedom, or an
    /// initial guess that does not lie within its bounds.
    #[error("fitting failed: {0}")]
    Fitting(String),

    /// Formula parse failure, undefined name, or evaluation failure.
    #[error("equation error: {0}")]
    Equation(String),

    /// Malformed parameter list or option value.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl FitError {
    pub fn fitting(message: impl Into<String>) -> Self {
        Self::Fitting(message.into())
    }

    pub fn equation(message: impl Into<String>) -> Self {
        Self::Equation(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Error reported by the `cfit` binary.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let (code, hint) = match &err {
            FitError::Validation(_) => (2, "check the parameter names and option values"),
            FitError::Equation(_) => (3, "check your formula syntax"),
            FitError::Fitting(_) => (4, "try a different model or initial guess"),
        };
        AppError::new(code, format!("{err} ({hint})"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
