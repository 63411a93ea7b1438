//! Declarative schema documents
//!
//! A document lists schema definitions whose field types are either built-in
//! type names (`integer`, `string`, `float`, `boolean`, `email`, with the
//! aliases `int`, `str`, `bool`), `list[T]`, or the name of another schema in
//! the same set. Documents are compiled into a [`SchemaSet`]; every reference
//! is resolved at that point, so unknown types and reference cycles never
//! reach validation time.

use crate::{Constraint, FieldDescriptor, FieldType, Schema, SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use verity_log::debug;

/// Top-level document: a list of schema definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub schemas: Vec<SchemaDefinition>,
}

/// One schema in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// One field in a schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintDefinition>,
}

/// A built-in constraint by name
///
/// `value` carries the limit, step, length or pattern; `values` the
/// allowed list for `one_of`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDefinition {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConstraintDefinition {
    /// Turn the definition into a constraint
    pub fn compile(&self) -> SchemaResult<Constraint> {
        let constraint = match self.kind.as_str() {
            "greater_than" | "gt" => Constraint::greater_than(self.number()?),
            "greater_or_equal" | "ge" => Constraint::greater_or_equal(self.number()?),
            "less_than" | "lt" => Constraint::less_than(self.number()?),
            "less_or_equal" | "le" => Constraint::less_or_equal(self.number()?),
            "multiple_of" => Constraint::multiple_of(self.number()?),
            "min_length" => Constraint::min_length(self.length()?),
            "max_length" => Constraint::max_length(self.length()?),
            "not_empty" => Constraint::not_empty(),
            "pattern" => Constraint::pattern(self.text()?)?,
            "one_of" => match &self.values {
                Some(values) => Constraint::one_of(values.iter().cloned()),
                None => return Err(self.invalid("expected a 'values' list")),
            },
            _ => return Err(self.invalid("unknown constraint kind")),
        };

        Ok(match &self.message {
            Some(message) => constraint.with_message(message.clone()),
            None => constraint,
        })
    }

    fn invalid(&self, reason: &str) -> SchemaError {
        SchemaError::InvalidConstraint {
            constraint: self.kind.clone(),
            reason: reason.to_string(),
        }
    }

    fn number(&self) -> SchemaResult<f64> {
        self.value
            .as_ref()
            .and_then(Value::as_f64)
            .ok_or_else(|| self.invalid("expected a numeric 'value'"))
    }

    fn length(&self) -> SchemaResult<usize> {
        self.value
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| self.invalid("expected a non-negative integer 'value'"))
    }

    fn text(&self) -> SchemaResult<&str> {
        self.value
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| self.invalid("expected a string 'value'"))
    }
}

/// Compiled schemas addressable by name
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: HashMap<String, Arc<Schema>>,
    order: Vec<String>,
}

impl SchemaSet {
    /// Compile every definition of a document
    pub fn from_document(document: &SchemaDocument) -> SchemaResult<Self> {
        Self::from_definitions(&document.schemas)
    }

    /// Compile a list of definitions that may reference each other
    pub fn from_definitions(definitions: &[SchemaDefinition]) -> SchemaResult<Self> {
        let mut compiler = Compiler::new(definitions)?;
        for definition in definitions {
            compiler.resolve(definition)?;
        }

        let mut set = SchemaSet::default();
        for definition in definitions {
            if let Some(schema) = compiler.built.remove(&definition.name) {
                set.insert(schema)?;
            }
        }

        debug!(target: "verity::document", "compiled {} schemas", set.len());
        Ok(set)
    }

    /// Add an already-built schema
    pub fn insert(&mut self, schema: impl Into<Arc<Schema>>) -> SchemaResult<()> {
        let schema = schema.into();
        let name = schema.name().to_string();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::DuplicateSchema(name));
        }
        self.order.push(name.clone());
        self.schemas.insert(name, schema);
        Ok(())
    }

    /// Move every schema of `other` into this set
    pub fn merge(&mut self, other: SchemaSet) -> SchemaResult<()> {
        let SchemaSet { mut schemas, order } = other;
        for name in order {
            if let Some(schema) = schemas.remove(&name) {
                self.insert(schema)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Schema names in definition order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

struct Compiler<'a> {
    definitions: HashMap<&'a str, &'a SchemaDefinition>,
    built: HashMap<String, Arc<Schema>>,
    stack: Vec<String>,
}

impl<'a> Compiler<'a> {
    fn new(definitions: &'a [SchemaDefinition]) -> SchemaResult<Self> {
        let mut by_name = HashMap::new();
        for definition in definitions {
            if by_name.insert(definition.name.as_str(), definition).is_some() {
                return Err(SchemaError::DuplicateSchema(definition.name.clone()));
            }
        }
        Ok(Self {
            definitions: by_name,
            built: HashMap::new(),
            stack: Vec::new(),
        })
    }

    fn resolve(&mut self, definition: &'a SchemaDefinition) -> SchemaResult<Arc<Schema>> {
        let name = definition.name.as_str();
        if let Some(schema) = self.built.get(name) {
            return Ok(Arc::clone(schema));
        }
        if let Some(start) = self.stack.iter().position(|n| n == name) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(SchemaError::ReferenceCycle(cycle));
        }

        self.stack.push(name.to_string());
        let mut builder = Schema::builder(&definition.name);
        for field in &definition.fields {
            let field_type = self.parse_type(&definition.name, field, field.type_name.trim())?;
            let mut descriptor = FieldDescriptor::new(&field.name, field_type);
            if let Some(default) = &field.default {
                descriptor = descriptor.with_default(default.clone());
            }
            for constraint in &field.constraints {
                descriptor = descriptor.constraint(constraint.compile()?);
            }
            builder = builder.field(descriptor);
        }
        self.stack.pop();

        let schema = Arc::new(builder.build()?);
        self.built.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn parse_type(
        &mut self,
        schema: &str,
        field: &FieldDefinition,
        expr: &str,
    ) -> SchemaResult<FieldType> {
        match expr {
            "integer" | "int" => return Ok(FieldType::Integer),
            "string" | "str" => return Ok(FieldType::String),
            "float" => return Ok(FieldType::Float),
            "boolean" | "bool" => return Ok(FieldType::Boolean),
            "email" => return Ok(FieldType::Email),
            _ => {}
        }

        if let Some(inner) = expr.strip_prefix("list[").and_then(|rest| rest.strip_suffix(']')) {
            let element = self.parse_type(schema, field, inner.trim())?;
            return Ok(FieldType::sequence(element));
        }

        if let Some(definition) = self.definitions.get(expr).copied() {
            return Ok(FieldType::Nested(self.resolve(definition)?));
        }

        Err(SchemaError::UnknownType {
            schema: schema.to_string(),
            field: field.name.clone(),
            type_name: field.type_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn document(value: Value) -> SchemaDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_compiles_forward_references() {
        let doc = document(json!({
            "schemas": [
                {"name": "User", "fields": [
                    {"name": "name", "type": "string"},
                    {"name": "address", "type": "Address"},
                    {"name": "previous", "type": "list[Address]"}
                ]},
                {"name": "Address", "fields": [
                    {"name": "zip", "type": "str", "constraints": [{"kind": "pattern", "value": "^[0-9]{5}$"}]}
                ]}
            ]
        }));

        let set = SchemaSet::from_document(&doc).unwrap();
        assert_eq!(set.names(), &["User".to_string(), "Address".to_string()]);

        let user = set.get("User").unwrap();
        assert_eq!(user.field("address").unwrap().field_type().type_name(), "Address");
        assert_eq!(user.field("previous").unwrap().field_type().type_name(), "list[Address]");

        let report = user
            .validate(json!({"name": "A", "address": {"zip": "1"}, "previous": []}).as_object().unwrap())
            .unwrap_err();
        assert_eq!(report.errors()[0].path, "address.zip");
        assert_eq!(report.errors()[0].kind, ErrorKind::ConstraintError);
    }

    #[test]
    fn test_unknown_type_is_construction_error() {
        let doc = document(json!({
            "schemas": [{"name": "User", "fields": [{"name": "age", "type": "decimal"}]}]
        }));

        assert_eq!(
            SchemaSet::from_document(&doc).unwrap_err(),
            SchemaError::UnknownType {
                schema: "User".into(),
                field: "age".into(),
                type_name: "decimal".into()
            }
        );
    }

    #[test]
    fn test_reference_cycle_rejected() {
        let doc = document(json!({
            "schemas": [
                {"name": "A", "fields": [{"name": "b", "type": "B"}]},
                {"name": "B", "fields": [{"name": "a", "type": "list[A]"}]}
            ]
        }));

        assert_eq!(
            SchemaSet::from_document(&doc).unwrap_err(),
            SchemaError::ReferenceCycle(vec!["A".into(), "B".into(), "A".into()])
        );
    }

    #[test]
    fn test_duplicate_schema_rejected() {
        let doc = document(json!({
            "schemas": [{"name": "A"}, {"name": "A"}]
        }));
        assert_eq!(
            SchemaSet::from_document(&doc).unwrap_err(),
            SchemaError::DuplicateSchema("A".into())
        );
    }

    #[test]
    fn test_constraint_definitions() {
        let gt = ConstraintDefinition {
            kind: "gt".into(),
            value: Some(json!(0)),
            values: None,
            message: Some("{value} should be greater than zero".into()),
        };
        let constraint = gt.compile().unwrap();
        assert_eq!(constraint.name(), "greater_than");
        assert_eq!(constraint.check(&json!(-1)).unwrap(), "-1 should be greater than zero");

        let one_of = ConstraintDefinition {
            kind: "one_of".into(),
            value: None,
            values: Some(vec![json!("a"), json!("b")]),
            message: None,
        };
        assert!(one_of.compile().unwrap().check(&json!("b")).is_none());
    }

    #[test]
    fn test_bad_constraint_definitions() {
        let unknown = ConstraintDefinition {
            kind: "shiny".into(),
            value: None,
            values: None,
            message: None,
        };
        assert!(matches!(unknown.compile(), Err(SchemaError::InvalidConstraint { .. })));

        let negative_length = ConstraintDefinition {
            kind: "max_length".into(),
            value: Some(json!(-1)),
            values: None,
            message: None,
        };
        assert!(negative_length.compile().is_err());
    }

    #[test]
    fn test_defaults_carried_over() {
        let doc = document(json!({
            "schemas": [{"name": "Flags", "fields": [
                {"name": "enabled", "type": "bool", "default": false}
            ]}]
        }));
        let set = SchemaSet::from_document(&doc).unwrap();
        let record = set.get("Flags").unwrap().validate(&serde_json::Map::new()).unwrap();
        assert_eq!(record.get("enabled"), Some(&json!(false)));
    }

    #[test]
    fn test_merge_detects_duplicates() {
        let doc = document(json!({"schemas": [{"name": "A"}]}));
        let mut first = SchemaSet::from_document(&doc).unwrap();
        let second = SchemaSet::from_document(&doc).unwrap();
        assert_eq!(first.merge(second), Err(SchemaError::DuplicateSchema("A".into())));
    }
}
