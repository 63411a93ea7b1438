// Declared field types and scalar coercion

use crate::Schema;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

// Structural `local@domain` check, not RFC 5322
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("email pattern is valid")
});

/// Type a field declares
#[derive(Debug, Clone)]
pub enum FieldType {
    /// 64-bit signed integer
    Integer,
    /// UTF-8 string
    String,
    /// 64-bit float
    Float,
    /// Boolean
    Boolean,
    /// String shaped like `local@domain`
    Email,
    /// Object validated against another schema
    Nested(Arc<Schema>),
    /// Array whose elements all coerce to the inner type
    Sequence(Box<FieldType>),
}

impl FieldType {
    /// Nested-schema type
    pub fn nested(schema: impl Into<Arc<Schema>>) -> Self {
        FieldType::Nested(schema.into())
    }

    /// Sequence-of-T type
    pub fn sequence(element: FieldType) -> Self {
        FieldType::Sequence(Box::new(element))
    }

    /// Name used in messages and schema documents
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Integer => "integer".to_string(),
            FieldType::String => "string".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Email => "email".to_string(),
            FieldType::Nested(schema) => schema.name().to_string(),
            FieldType::Sequence(element) => format!("list[{}]", element.type_name()),
        }
    }

    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    pub(crate) fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Email)
    }

    pub(crate) fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Nested(_) | FieldType::Sequence(_))
    }
}

/// JSON type name of a raw value, for messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(type_name: &str, raw: &Value) -> String {
    format!("expected {}, got {}", type_name, json_type_name(raw))
}

pub(crate) fn coerce_integer(raw: &Value, accept_integral_floats: bool) -> Result<Value, String> {
    let Value::Number(number) = raw else {
        return Err(expected("integer", raw));
    };

    if let Some(i) = number.as_i64() {
        return Ok(Value::from(i));
    }
    if number.is_u64() {
        return Err(format!("integer {} is out of range", number));
    }

    // Remaining case is a float
    let f = number.as_f64().unwrap_or(f64::NAN);
    if f.fract() != 0.0 || !f.is_finite() {
        return Err(format!("expected an integer-valued number, got {}", number));
    }
    if !accept_integral_floats {
        return Err(expected("integer", raw));
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(format!("integer {} is out of range", number));
    }
    Ok(Value::from(f as i64))
}

pub(crate) fn coerce_float(raw: &Value) -> Result<Value, String> {
    match raw.as_f64() {
        Some(f) if raw.is_number() => Ok(Value::from(f)),
        _ => Err(expected("float", raw)),
    }
}

pub(crate) fn coerce_string(raw: &Value) -> Result<Value, String> {
    match raw {
        Value::String(s) => Ok(Value::String(s.clone())),
        _ => Err(expected("string", raw)),
    }
}

pub(crate) fn coerce_email(raw: &Value) -> Result<Value, String> {
    let Value::String(s) = raw else {
        return Err(expected("email string", raw));
    };
    if EMAIL_REGEX.is_match(s) {
        Ok(Value::String(s.clone()))
    } else {
        Err(format!("'{}' is not a valid email address", s))
    }
}

pub(crate) fn coerce_boolean(raw: &Value) -> Result<Value, String> {
    match raw {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        _ => Err(expected("boolean", raw)),
    }
}
