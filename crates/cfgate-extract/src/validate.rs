//! Second-pass payload validation.
//!
//! Decoding only checks structure. Payloads that carry semantic rules (name
//! formats, mutually exclusive relationships, metadata prefixes) implement
//! [`Validate`]; failures become `422 CF-UnprocessableEntity` with one message
//! per offending field.

use std::fmt;

/// Semantic validation run after a payload decodes.
///
/// # Example
///
/// ```
/// use cfgate_extract::{Validate, ValidationErrors};
///
/// struct SpaceCreate {
///     name: String,
/// }
///
/// impl Validate for SpaceCreate {
///     fn validate(&self) -> Result<(), ValidationErrors> {
///         let mut errors = ValidationErrors::new();
///         if self.name.is_empty() {
///             errors.add("name", "cannot be blank");
///         }
///         errors.into_result()
///     }
/// }
///
/// let err = SpaceCreate { name: String::new() }.validate().unwrap_err();
/// assert_eq!(err.to_string(), "name cannot be blank");
/// ```
pub trait Validate {
    /// Checks the decoded payload.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted field path, empty for whole-payload rules.
    pub field: String,
    /// What is wrong, phrased to follow the field name.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} {}", self.field, self.message)
        }
    }
}

/// A set of field errors.
///
/// Renders as the sorted messages joined by `", "` so output is stable
/// regardless of the order rules ran in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure on `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Merges errors from a nested payload under `prefix`.
    ///
    /// Numeric prefixes are rendered as indices, e.g. `processes[0].type`.
    pub fn nest(&mut self, prefix: &str, nested: Self) {
        for err in nested.errors {
            let field = match (prefix.parse::<usize>(), err.field.is_empty()) {
                (Ok(index), true) => format!("[{index}]"),
                (Ok(index), false) => format!("[{index}].{}", err.field),
                (Err(_), true) => prefix.to_string(),
                (Err(_), false) => format!("{prefix}.{}", err.field),
            };
            self.errors.push(FieldError {
                field,
                message: err.message,
            });
        }
    }

    /// Returns `true` if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The individual failures.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        messages.sort();
        f.write_str(&messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}
