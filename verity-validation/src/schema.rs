// Schemas and validated records

use crate::{Engine, FieldDescriptor, SchemaError, SchemaResult, ValidationErrors};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Named, ordered, immutable collection of field descriptors
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Start building a schema
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptors in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate an input record with the default engine settings
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Record, ValidationErrors> {
        Engine::default().validate_record(self, input)
    }
}

/// Builder for [`Schema`]
///
/// `build` is where programmer errors surface: empty or duplicate names,
/// constraints that cannot apply to their field's type, degenerate limits
/// and defaults that do not coerce to their field's type.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Check and freeze the schema
    pub fn build(self) -> SchemaResult<Schema> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptySchemaName);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name().trim().is_empty() {
                return Err(SchemaError::EmptyFieldName {
                    schema: self.name.clone(),
                });
            }
            if !seen.insert(field.name()) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name().to_string(),
                });
            }
            for constraint in field.constraints() {
                if !constraint.applies_to(field.field_type()) {
                    return Err(SchemaError::IncompatibleConstraint {
                        schema: self.name.clone(),
                        field: field.name().to_string(),
                        constraint: constraint.name().to_string(),
                        type_name: field.field_type().type_name(),
                    });
                }
                constraint.verify()?;
            }
        }

        let mut fields = self.fields;
        for field in &mut fields {
            let Some(default) = field.default_value().cloned() else {
                continue;
            };
            let coerced = field.coerce(&default).map_err(|report| SchemaError::InvalidDefault {
                schema: self.name.clone(),
                field: field.name().to_string(),
                reason: report.render(),
            })?;
            field.replace_default(coerced);
        }

        Ok(Schema {
            name: self.name,
            fields,
        })
    }
}

/// Field name to coerced value, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: Map<String, Value>,
}

impl Record {
    pub(crate) fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.values.iter()
    }

    /// Borrow as an input record, e.g. to validate it again
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.values)
    }
}
