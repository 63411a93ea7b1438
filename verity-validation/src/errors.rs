// Validation errors

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Category of a single validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Required field absent and no default declared
    MissingField,
    /// Raw value could not be coerced to the declared type
    TypeError,
    /// A constraint rejected the coerced value
    ConstraintError,
    /// A post-validator rejected the value
    ValueError,
    /// Input key not declared by the schema (only when unknown fields are forbidden)
    ExtraField,
}

impl ErrorKind {
    /// Stable name used in rendered reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "MissingField",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ConstraintError => "ConstraintError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::ExtraField => "ExtraField",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an error report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Field path, e.g. `address.zip` or `tags[2]`
    pub path: String,

    /// Failure category
    pub kind: ErrorKind,

    /// Human-readable message
    pub message: String,

    /// Name of the failing constraint or post-validator
    pub constraint: Option<String>,

    /// Offending input value
    pub value: Option<Value>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(path: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
            constraint: None,
            value: None,
        }
    }

    /// Required field absent
    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::MissingField, "field required")
    }

    /// Raw value does not fit the declared type
    pub fn type_mismatch(path: impl Into<String>, message: impl Into<String>, value: &Value) -> Self {
        Self::new(path, ErrorKind::TypeError, message).with_value(value.clone())
    }

    /// Undeclared input key
    pub fn extra_field(path: impl Into<String>, value: &Value) -> Self {
        Self::new(path, ErrorKind::ExtraField, "extra fields not permitted").with_value(value.clone())
    }

    /// Set the constraint or validator name
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    /// Set the invalid value
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [kind={}]", self.path, self.message, self.kind)
    }
}

impl std::error::Error for ValidationError {}

/// Ordered report of every failure found in one validation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new validation errors collection
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Entries in report order
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Iterate over entries in report order
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Get errors for a specific path
    pub fn get_field_errors(&self, path: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.path == path).collect()
    }

    /// Get errors of one kind
    pub fn of_kind(&self, kind: ErrorKind) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.kind == kind).collect()
    }

    /// One line per entry, `<path>: <message> [kind=<kind>]`
    pub fn render(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "errors": self.errors.iter().map(|e| {
                serde_json::json!({
                    "path": e.path,
                    "kind": e.kind.as_str(),
                    "message": e.message,
                    "constraint": e.constraint,
                    "value": e.value,
                })
            }).collect::<Vec<_>>()
        })
    }

    /// Take ownership of the entries
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }

    pub(crate) fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub(crate) fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::new(errors)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Programmer errors detected while building a schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("schema name must not be empty")]
    EmptySchemaName,

    #[error("schema '{schema}': field name must not be empty")]
    EmptyFieldName { schema: String },

    #[error("schema '{schema}': duplicate field '{field}'")]
    DuplicateField { schema: String, field: String },

    #[error("schema '{schema}': field '{field}' has unknown type '{type_name}'")]
    UnknownType {
        schema: String,
        field: String,
        type_name: String,
    },

    #[error("schema '{schema}': constraint '{constraint}' cannot apply to {type_name} field '{field}'")]
    IncompatibleConstraint {
        schema: String,
        field: String,
        constraint: String,
        type_name: String,
    },

    #[error("schema '{schema}': default for field '{field}' does not fit its type: {reason}")]
    InvalidDefault {
        schema: String,
        field: String,
        reason: String,
    },

    #[error("invalid constraint '{constraint}': {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("duplicate schema '{0}'")]
    DuplicateSchema(String),

    #[error("schema reference cycle: {}", .0.join(" -> "))]
    ReferenceCycle(Vec<String>),
}

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;
