//! Environment-driven solver defaults.
//!
//! `.env` in the working directory is loaded first (if present), then these
//! variables override [`FitOptions::default`]:
//!
//! - `CURVEFIT_MAX_EVALUATIONS`
//! - `CURVEFIT_FTOL`, `CURVEFIT_XTOL`, `CURVEFIT_GTOL`
//! - `CURVEFIT_CONFIDENCE` (e.g. `0.99`)

use std::str::FromStr;

use crate::error::FitError;
use crate::fit::FitOptions;

pub const ENV_MAX_EVALUATIONS: &str = "CURVEFIT_MAX_EVALUATIONS";
pub const ENV_FTOL: &str = "CURVEFIT_FTOL";
pub const ENV_XTOL: &str = "CURVEFIT_XTOL";
pub const ENV_GTOL: &str = "CURVEFIT_GTOL";
pub const ENV_CONFIDENCE: &str = "CURVEFIT_CONFIDENCE";

impl FitOptions {
    /// Defaults overridden from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, FitError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_MAX_EVALUATIONS)? {
            options.max_evaluations = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_FTOL)? {
            options.ftol = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_XTOL)? {
            options.xtol = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_GTOL)? {
            options.gtol = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_CONFIDENCE)? {
            options.confidence_level = v;
        }
        options.check()?;
        Ok(options)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, FitError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FitError::validation(format!("{key}={raw:?} is not a valid value"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let options = FitOptions::from_lookup(lookup(&[])).unwrap();
        assert_eq!(options, FitOptions::default());
        assert_eq!(options.max_evaluations, 10_000);
    }

    #[test]
    fn variables_override_defaults() {
        let options = FitOptions::from_lookup(lookup(&[
            (ENV_MAX_EVALUATIONS, "500"),
            (ENV_CONFIDENCE, " 0.99 "),
        ]))
        .unwrap();
        assert_eq!(options.max_evaluations, 500);
        assert_eq!(options.confidence_level, 0.99);
    }

    #[test]
    fn malformed_values_are_validation_errors() {
        let err = FitOptions::from_lookup(lookup(&[(ENV_FTOL, "tiny")])).unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
        let err = FitOptions::from_lookup(lookup(&[(ENV_CONFIDENCE, "1.5")])).unwrap_err();
        assert!(matches!(err, FitError::Validation(_)));
    }
}
