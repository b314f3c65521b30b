//! Equation registry: model name → parameter names + display template.
//!
//! The registry is built once (usually [`EquationRegistry::standard`]) and then
//! shared by reference. It has no interior mutability, so a shared
//! `&EquationRegistry` can be read from any number of threads.

use std::collections::BTreeMap;

use crate::error::FitError;
use crate::models::ModelKind;

/// Metadata for one equation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquationEntry {
    pub parameter_names: Vec<String>,
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquationRegistry {
    entries: BTreeMap<String, EquationEntry>,
}

impl EquationRegistry {
    /// Registry of every built-in [`ModelKind`].
    pub fn standard() -> Self {
        ModelKind::ALL.into_iter().fold(Self::default(), |registry, kind| {
            registry.with_entry(
                kind.name(),
                EquationEntry {
                    parameter_names: kind.parameter_names().iter().map(|s| s.to_string()).collect(),
                    template: kind.template().to_string(),
                },
            )
        })
    }

    /// Add (or replace) an entry while the registry is still being assembled.
    pub fn with_entry(mut self, name: impl Into<String>, entry: EquationEntry) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EquationEntry> {
        self.entries.get(name)
    }

    pub fn parameter_names(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(|e| e.parameter_names.as_slice())
    }

    pub fn template(&self, name: &str) -> Option<&str> {
        self.get(name).map(|e| e.template.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Render the equation `name` with fitted `values`.
    pub fn render(&self, name: &str, values: &[f64]) -> Result<String, FitError> {
        let entry = self
            .get(name)
            .ok_or_else(|| FitError::validation(format!("no equation registered as '{name}'")))?;
        if entry.parameter_names.len() != values.len() {
            return Err(FitError::validation(format!(
                "equation '{name}' takes {} parameters, got {}",
                entry.parameter_names.len(),
                values.len()
            )));
        }
        Ok(render_template(&entry.template, &entry.parameter_names, values))
    }
}

/// Substitute `{name}` placeholders in `template` with formatted values.
///
/// A negative value folds its sign into the operator in front of the
/// placeholder: `x + {n}` renders as `x - 1.5`, `x - {c}` as `x + 1.5` and
/// `-{b}` as `1.5`. Anywhere else the signed value is inserted as is.
pub fn render_template(template: &str, names: &[String], values: &[f64]) -> String {
    let mut out = String::with_capacity(template.len() + 8 * values.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|k| open + k) else {
            break;
        };
        out.push_str(&rest[..open]);
        let name = &rest[open + 1..close];
        match names.iter().position(|n| n == name).and_then(|k| values.get(k)) {
            Some(&value) => push_signed(&mut out, value),
            None => out.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    out
}

fn push_signed(out: &mut String, value: f64) {
    if value < 0.0 {
        let magnitude = format_value(-value);
        if out.ends_with("+ ") || out.ends_with("- ") {
            let flipped = if out.ends_with("+ ") { "- " } else { "+ " };
            out.truncate(out.len() - 2);
            out.push_str(flipped);
            out.push_str(&magnitude);
            return;
        }
        if out.ends_with('-') {
            out.pop();
            out.push_str(&magnitude);
            return;
        }
    }
    out.push_str(&format_value(value));
}

/// Six significant digits, switching to scientific notation for very large or
/// small magnitudes.
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e6).contains(&magnitude) {
        format!("{value:.5e}")
    } else {
        let decimals = if magnitude == 0.0 {
            0
        } else {
            (5 - magnitude.log10().floor() as i32).clamp(0, 9) as usize
        };
        format!("{value:.decimals$}")
    }
}
