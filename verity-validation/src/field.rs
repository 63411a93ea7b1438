// Field descriptors

use crate::constraints::display_value;
use crate::{
    Constraint, Engine, ErrorKind, FieldType, FnValidator, PostValidator, Schema, ValidationError,
    ValidationErrors,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Declares one record field: its type, default, constraints and post-validators
///
/// Built by value; once placed in a [`Schema`] it is never mutated.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    default: Option<Value>,
    constraints: Vec<Constraint>,
    post_validators: Vec<Arc<dyn PostValidator>>,
}

impl FieldDescriptor {
    /// Create a required field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
            constraints: Vec::new(),
            post_validators: Vec::new(),
        }
    }

    /// Required integer field
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Required string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Required float field
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Required boolean field
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Required email field
    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Email)
    }

    /// Required nested-schema field
    pub fn nested(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        Self::new(name, FieldType::nested(schema))
    }

    /// Required sequence field
    pub fn sequence(name: impl Into<String>, element: FieldType) -> Self {
        Self::new(name, FieldType::sequence(element))
    }

    /// Value used when the field is absent
    ///
    /// It must coerce to the declared type; [`crate::SchemaBuilder::build`] stores the
    /// coerced form. Constraints and post-validators never run on it.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Append a constraint
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Append a post-validator
    pub fn post_validator(mut self, validator: impl PostValidator + 'static) -> Self {
        self.post_validators.push(Arc::new(validator));
        self
    }

    /// Append a closure post-validator
    pub fn validate_with<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.post_validator(FnValidator::new(name, func))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Names of the attached post-validators, in run order
    pub fn post_validator_names(&self) -> Vec<&str> {
        self.post_validators.iter().map(|v| v.name()).collect()
    }

    /// A field without a default must be present in the input
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Coerce a raw value to the declared type with the default engine settings
    ///
    /// Nested and sequence types may yield several entries, all prefixed with
    /// this field's name.
    pub fn coerce(&self, raw: &Value) -> Result<Value, ValidationErrors> {
        let mut report = ValidationErrors::default();
        match Engine::default().coerce(&self.field_type, raw, &self.name, &mut report) {
            Some(value) if report.is_empty() => Ok(value),
            _ => Err(report),
        }
    }

    /// Every failing constraint, in declaration order
    pub fn check_constraints(&self, value: &Value) -> Vec<ValidationError> {
        self.check_constraints_at(value, &self.name)
    }

    /// Run post-validators in order, stopping at the first rejection
    pub fn run_post_validators(&self, value: Value) -> Result<Value, ValidationError> {
        self.run_post_validators_at(value, &self.name)
    }

    pub(crate) fn replace_default(&mut self, default: Value) {
        self.default = Some(default);
    }

    pub(crate) fn check_constraints_at(&self, value: &Value, path: &str) -> Vec<ValidationError> {
        self.constraints
            .iter()
            .filter_map(|constraint| {
                constraint.check(value).map(|message| {
                    ValidationError::new(path, ErrorKind::ConstraintError, message)
                        .with_constraint(constraint.name())
                        .with_value(value.clone())
                })
            })
            .collect()
    }

    pub(crate) fn run_post_validators_at(
        &self,
        value: Value,
        path: &str,
    ) -> Result<Value, ValidationError> {
        let mut current = value;
        for validator in &self.post_validators {
            let input = current.clone();
            current = validator.apply(current).map_err(|message| {
                ValidationError::new(path, ErrorKind::ValueError, message)
                    .with_constraint(validator.name())
                    .with_value(input)
            })?;
        }
        Ok(current)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("type", &self.field_type.type_name())
            .field("default", &self.default.as_ref().map(display_value))
            .field("constraints", &self.constraints)
            .field("post_validators", &self.post_validator_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_coerce_reports_type_error_at_field_name() {
        let field = FieldDescriptor::integer("age");
        let report = field.coerce(&json!("thirty")).unwrap_err();

        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].path, "age");
        assert_eq!(report.errors()[0].kind, ErrorKind::TypeError);
        assert_eq!(report.errors()[0].value, Some(json!("thirty")));
    }

    #[test]
    fn test_constraints_are_exhaustive() {
        let field = FieldDescriptor::string("username")
            .constraint(Constraint::min_length(5))
            .constraint(Constraint::pattern("^[a-z]+$").unwrap())
            .constraint(Constraint::max_length(10));

        let errors = field.check_constraints(&json!("A1"));
        let names: Vec<_> = errors.iter().map(|e| e.constraint.as_deref()).collect();
        assert_eq!(names, vec![Some("min_length"), Some("pattern")]);
        assert!(errors.iter().all(|e| e.kind == ErrorKind::ConstraintError));
    }

    #[test]
    fn test_post_validators_chain_transforms() {
        let field = FieldDescriptor::string("name")
            .post_validator(crate::Trim)
            .validate_with("capitalize", |value| {
                let s = value.as_str().unwrap_or_default();
                let mut chars = s.chars();
                let capitalized = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                };
                Ok(Value::String(capitalized))
            });

        assert_eq!(field.run_post_validators(json!("  john ")), Ok(json!("John")));
        assert_eq!(field.post_validator_names(), vec!["trim", "capitalize"]);
    }

    #[test]
    fn test_post_validators_short_circuit() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&calls);
        let second = Arc::clone(&calls);

        let field = FieldDescriptor::integer("count")
            .validate_with("reject", move |_| {
                first.lock().unwrap().push("reject");
                Err("rejected".to_string())
            })
            .validate_with("record_call", move |value| {
                second.lock().unwrap().push("record_call");
                Ok(value)
            });

        let err = field.run_post_validators(json!(3)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueError);
        assert_eq!(err.message, "rejected");
        assert_eq!(err.constraint.as_deref(), Some("reject"));
        assert_eq!(*calls.lock().unwrap(), vec!["reject"]);
    }

    #[test]
    fn test_required_depends_on_default() {
        assert!(FieldDescriptor::boolean("active").is_required());
        let field = FieldDescriptor::boolean("active").with_default(true);
        assert!(!field.is_required());
        assert_eq!(field.default_value(), Some(&json!(true)));
    }
}
