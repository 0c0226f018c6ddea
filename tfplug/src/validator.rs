//! Attribute validators
//!
//! Validators run during configuration validation. They only look at known
//! values; null and unknown values pass through untouched.

use crate::types::{AttributePath, Diagnostic, Dynamic};

pub trait Validator: Send + Sync {
    fn description(&self) -> String;

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>);
}

fn invalid(path: &AttributePath, summary: String, detail: String) -> Diagnostic {
    Diagnostic::error(summary, detail).with_attribute(path.clone())
}

/// String length in characters, inclusive bounds
pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        format!(
            "string length must be between {} and {}",
            self.min.unwrap_or(0),
            self.max.map_or("unbounded".to_string(), |m| m.to_string())
        )
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(s) = value.as_str() else { return };
        let len = s.chars().count();

        if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
            diagnostics.push(invalid(
                path,
                format!("Invalid length for {}", path),
                format!("{}, got {}", self.description(), len),
            ));
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: &str, description: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: regex::Regex::new(pattern)?,
            description: description.to_string(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        format!("value must be {}", self.description)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(s) = value.as_str() else { return };
        if !self.pattern.is_match(s) {
            diagnostics.push(invalid(
                path,
                format!("Invalid value for {}", path),
                format!("{}, got {:?}", self.description(), s),
            ));
        }
    }
}

/// Inclusive numeric range
pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(n) = value.as_number() else { return };
        if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
            diagnostics.push(invalid(
                path,
                format!("Value out of range for {}", path),
                format!("{}, got {}", self.description(), n),
            ));
        }
    }
}

/// String enum
pub struct OneOfValidator {
    pub allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn new<S: AsRef<str>>(allowed: &[S]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(s) = value.as_str() else { return };
        if !self.allowed.iter().any(|a| a == s) {
            diagnostics.push(invalid(
                path,
                format!("Invalid value for {}", path),
                format!("{}, got {:?}", self.description(), s),
            ));
        }
    }
}

/// Element count of a list or set
pub struct CollectionSizeValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl CollectionSizeValidator {
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for CollectionSizeValidator {
    fn description(&self) -> String {
        format!(
            "collection must contain between {} and {} elements",
            self.min.unwrap_or(0),
            self.max.map_or("unbounded".to_string(), |m| m.to_string())
        )
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(items) = value.as_list() else { return };
        let len = items.len();
        if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
            diagnostics.push(invalid(
                path,
                format!("Invalid element count for {}", path),
                format!("{}, got {}", self.description(), len),
            ));
        }
    }
}
