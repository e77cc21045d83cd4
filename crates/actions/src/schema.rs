//! Input schemas.
//!
//! A [`Schema`] turns the raw JSON input of an invocation into the typed value
//! the handler receives, or explains why it cannot. Two implementations ship
//! with the crate:
//!
//! - any `Fn(&Value) -> Result<V, ValidationIssues>` closure, for hand-written
//!   checks;
//! - [`JsonSchema`], a JSON Schema document compiled with the `jsonschema`
//!   crate, followed by a serde conversion into `V`.

use std::marker::PhantomData;

use jsonschema::error::ValidationErrorKind;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::FieldErrors;

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// One reason an input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path of the offending field, outermost segment first. Empty for issues
    /// about the input as a whole.
    pub path: Vec<String>,
    /// Human-readable message.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue for the field at `path` (dot-separated).
    pub fn at(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            message: message.into(),
        }
    }

    /// Creates an issue about the input as a whole.
    pub fn root(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// Dot-joined field path; empty for root-level issues.
    pub fn field(&self) -> String {
        self.path.join(".")
    }
}

/// Every issue found while parsing one input, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    /// Creates an empty issue list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an issue.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.0.push(issue);
    }

    /// Returns `true` if no issue was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the issues in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    /// Groups messages by field path. Root-level issues have no field and are
    /// left out.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for issue in self.0.iter().filter(|issue| !issue.path.is_empty()) {
            errors
                .entry(issue.field())
                .or_default()
                .push(issue.message.clone());
        }
        errors
    }

    /// One-line summary built from the first issue only:
    /// `"<field path>: <message>"`.
    ///
    /// A root-level issue has no path, so its summary is the bare message
    /// with no `": "` prefix.
    pub fn summary(&self) -> String {
        let Some(first) = self.0.first() else {
            return "Invalid input".to_string();
        };
        let line = if first.path.is_empty() {
            first.message.clone()
        } else {
            format!("{}: {}", first.field(), first.message)
        };
        line.lines().collect::<Vec<_>>().join(" ")
    }
}

impl From<ValidationIssue> for ValidationIssues {
    fn from(issue: ValidationIssue) -> Self {
        Self(vec![issue])
    }
}

impl FromIterator<ValidationIssue> for ValidationIssues {
    fn from_iter<I: IntoIterator<Item = ValidationIssue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Schema port
// ---------------------------------------------------------------------------

/// Parses a raw invocation input into the handler's input type `V`.
pub trait Schema<V>: Send + Sync {
    /// Validates `input` and converts it.
    ///
    /// # Errors
    ///
    /// Returns every issue found; the list is never empty.
    fn parse(&self, input: &Value) -> Result<V, ValidationIssues>;
}

impl<V, F> Schema<V> for F
where
    F: Fn(&Value) -> Result<V, ValidationIssues> + Send + Sync,
{
    fn parse(&self, input: &Value) -> Result<V, ValidationIssues> {
        self(input)
    }
}

// ---------------------------------------------------------------------------
// JSON Schema
// ---------------------------------------------------------------------------

/// The schema document itself could not be compiled.
#[derive(Debug, Error)]
#[error("invalid JSON schema: {message}")]
pub struct SchemaError {
    /// Description of the schema error.
    pub message: String,
}

/// A compiled JSON Schema whose accepted documents deserialize into `V`.
pub struct JsonSchema<V> {
    validator: jsonschema::Validator,
    _target: PhantomData<fn() -> V>,
}

impl<V> std::fmt::Debug for JsonSchema<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchema").finish_non_exhaustive()
    }
}

impl<V: DeserializeOwned> JsonSchema<V> {
    /// Compiles `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if `schema` is not a valid JSON Schema.
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::validator_for(schema).map_err(|e| SchemaError {
            message: e.to_string(),
        })?;
        Ok(Self {
            validator,
            _target: PhantomData,
        })
    }
}

impl<V: DeserializeOwned> Schema<V> for JsonSchema<V> {
    fn parse(&self, input: &Value) -> Result<V, ValidationIssues> {
        let issues: ValidationIssues = self
            .validator
            .iter_errors(input)
            .map(|error| {
                let mut path = pointer_segments(&error.instance_path().to_string());
                // `required` is reported against the parent object; attribute it
                // to the missing property instead.
                if let ValidationErrorKind::Required { property } = error.kind() {
                    if let Some(name) = property.as_str() {
                        path.push(name.to_string());
                    }
                }
                ValidationIssue {
                    path,
                    message: error.to_string(),
                }
            })
            .collect();

        if !issues.is_empty() {
            return Err(issues);
        }

        serde_json::from_value(input.clone())
            .map_err(|e| ValidationIssue::root(e.to_string()).into())
    }
}

/// Splits a JSON pointer (`/author/name`) into unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}
