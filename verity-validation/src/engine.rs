// Validation engine

use crate::types::{coerce_boolean, coerce_email, coerce_float, coerce_integer, coerce_string};
use crate::{FieldDescriptor, FieldType, Record, Schema, ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use verity_log::{debug, trace};

/// Path reported when the input itself is not an object
pub const ROOT_PATH: &str = "$root";

/// What to do with input keys no field declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Drop them silently
    #[default]
    Ignore,
    /// Report each one as an `ExtraField` entry
    Forbid,
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Handling of undeclared input keys
    pub unknown_fields: UnknownFieldPolicy,
    /// Accept `30.0` for an integer field
    pub accept_integral_floats: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Ignore,
            accept_integral_floats: true,
        }
    }
}

/// Runs schemas against input records and collects every failure
///
/// Stateless apart from its settings; one engine may serve any number of
/// threads and schemas.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the given settings
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate any JSON value; a non-object yields a single `TypeError` at `$root`
    pub fn run(&self, schema: &Schema, input: &Value) -> Result<Record, ValidationErrors> {
        match input {
            Value::Object(map) => self.validate_record(schema, map),
            other => {
                debug!(target: "verity::engine", "schema '{}' received a non-object input", schema.name());
                Err(ValidationErrors::from(vec![ValidationError::type_mismatch(
                    ROOT_PATH,
                    format!(
                        "expected object for schema '{}', got {}",
                        schema.name(),
                        crate::json_type_name(other)
                    ),
                    other,
                )]))
            }
        }
    }

    /// Validate an input record; all-or-nothing
    pub fn validate_record(
        &self,
        schema: &Schema,
        input: &Map<String, Value>,
    ) -> Result<Record, ValidationErrors> {
        debug!(
            target: "verity::engine",
            "validating record against '{}' ({} fields, {} input keys)",
            schema.name(),
            schema.len(),
            input.len()
        );

        let mut report = ValidationErrors::default();
        let values = self.validate_object(schema, input, "", &mut report);

        if report.is_empty() {
            debug!(target: "verity::engine", "schema '{}' accepted record", schema.name());
            Ok(Record::new(values))
        } else {
            debug!(
                target: "verity::engine",
                "schema '{}' rejected record with {} errors",
                schema.name(),
                report.len()
            );
            Err(report)
        }
    }

    fn validate_object(
        &self,
        schema: &Schema,
        input: &Map<String, Value>,
        prefix: &str,
        report: &mut ValidationErrors,
    ) -> Map<String, Value> {
        let mut values = Map::new();

        for field in schema.fields() {
            let path = join_path(prefix, field.name());
            if let Some(value) = self.validate_field(field, input.get(field.name()), &path, report) {
                values.insert(field.name().to_string(), value);
            }
        }

        if self.config.unknown_fields == UnknownFieldPolicy::Forbid {
            for (key, value) in input {
                if schema.field(key).is_none() {
                    report.push(ValidationError::extra_field(join_path(prefix, key), value));
                }
            }
        }

        values
    }

    // presence/default -> coercion -> constraints -> post-validators
    fn validate_field(
        &self,
        field: &FieldDescriptor,
        raw: Option<&Value>,
        path: &str,
        report: &mut ValidationErrors,
    ) -> Option<Value> {
        trace!(target: "verity::engine", "field '{}'", path);

        let Some(raw) = raw else {
            return match field.default_value() {
                Some(default) => Some(default.clone()),
                None => {
                    report.push(ValidationError::missing(path));
                    None
                }
            };
        };

        let value = self.coerce(field.field_type(), raw, path, report)?;

        let violations = field.check_constraints_at(&value, path);
        if !violations.is_empty() {
            report.extend(violations);
            return None;
        }

        match field.run_post_validators_at(value, path) {
            Ok(value) => Some(value),
            Err(error) => {
                report.push(error);
                None
            }
        }
    }

    /// Coerce `raw` to `field_type`, pushing failures onto `report`
    pub(crate) fn coerce(
        &self,
        field_type: &FieldType,
        raw: &Value,
        path: &str,
        report: &mut ValidationErrors,
    ) -> Option<Value> {
        let scalar = match field_type {
            FieldType::Integer => coerce_integer(raw, self.config.accept_integral_floats),
            FieldType::Float => coerce_float(raw),
            FieldType::String => coerce_string(raw),
            FieldType::Email => coerce_email(raw),
            FieldType::Boolean => coerce_boolean(raw),
            FieldType::Nested(schema) => {
                let Some(map) = raw.as_object() else {
                    report.push(ValidationError::type_mismatch(
                        path,
                        format!("expected object for '{}', got {}", schema.name(), crate::json_type_name(raw)),
                        raw,
                    ));
                    return None;
                };
                let before = report.len();
                let values = self.validate_object(schema, map, path, report);
                return (report.len() == before).then_some(Value::Object(values));
            }
            FieldType::Sequence(element) => {
                let Some(items) = raw.as_array() else {
                    report.push(ValidationError::type_mismatch(
                        path,
                        format!("expected array, got {}", crate::json_type_name(raw)),
                        raw,
                    ));
                    return None;
                };
                let before = report.len();
                let values: Vec<Value> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| {
                        self.coerce(element, item, &index_path(path, index), report)
                    })
                    .collect();
                return (report.len() == before).then_some(Value::Array(values));
            }
        };

        match scalar {
            Ok(value) => Some(value),
            Err(message) => {
                report.push(ValidationError::type_mismatch(path, message, raw));
                None
            }
        }
    }
}

/// `address` + `zip` -> `address.zip`
pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// `tags` + 2 -> `tags[2]`
pub(crate) fn index_path(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Constraint, ErrorKind};
    use serde_json::json;
    use std::sync::Arc;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn user_schema() -> Schema {
        Schema::builder("User")
            .field(FieldDescriptor::string("name"))
            .field(
                FieldDescriptor::integer("age").constraint(
                    Constraint::greater_than(0).with_message("{value} should be greater than zero"),
                ),
            )
            .build()
            .unwrap()
    }

    fn address_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder("Address")
                .field(FieldDescriptor::string("city"))
                .field(FieldDescriptor::string("zip").constraint(Constraint::pattern(r"^\d{5}$").unwrap()))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_user_example_rejected() {
        let report = user_schema().validate(&map(json!({"name": "John", "age": -1}))).unwrap_err();

        assert_eq!(report.len(), 1);
        let entry = &report.errors()[0];
        assert_eq!(entry.path, "age");
        assert_eq!(entry.kind, ErrorKind::ConstraintError);
        assert_eq!(entry.message, "-1 should be greater than zero");
        assert_eq!(entry.value, Some(json!(-1)));
    }

    #[test]
    fn test_user_example_accepted() {
        let record = user_schema().validate(&map(json!({"name": "John", "age": 30}))).unwrap();
        assert_eq!(Value::from(record), json!({"name": "John", "age": 30}));
    }

    #[test]
    fn test_missing_field_reported_once() {
        let report = user_schema().validate(&map(json!({"age": "old"}))).unwrap_err();

        assert_eq!(report.get_field_errors("name").len(), 1);
        assert_eq!(report.get_field_errors("name")[0].kind, ErrorKind::MissingField);
        // Other fields still validated
        assert_eq!(report.get_field_errors("age")[0].kind, ErrorKind::TypeError);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_default_bypasses_constraints() {
        let schema = Schema::builder("Settings")
            .field(
                FieldDescriptor::integer("retries")
                    .with_default(-5)
                    .constraint(Constraint::greater_or_equal(0)),
            )
            .build()
            .unwrap();

        let record = schema.validate(&Map::new()).unwrap();
        assert_eq!(record.get("retries"), Some(&json!(-5)));
    }

    #[test]
    fn test_type_error_skips_constraints_and_post_validators() {
        let schema = Schema::builder("User")
            .field(
                FieldDescriptor::integer("age")
                    .constraint(Constraint::greater_than(0))
                    .validate_with("never", |_| Err("should not run".to_string())),
            )
            .build()
            .unwrap();

        let report = schema.validate(&map(json!({"age": 1.5}))).unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_constraint_failure_skips_post_validators() {
        let schema = Schema::builder("User")
            .field(
                FieldDescriptor::integer("age")
                    .constraint(Constraint::greater_than(0))
                    .validate_with("never", |_| Err("should not run".to_string())),
            )
            .build()
            .unwrap();

        let report = schema.validate(&map(json!({"age": 0}))).unwrap_err();
        assert_eq!(report.of_kind(ErrorKind::ValueError).len(), 0);
        assert_eq!(report.of_kind(ErrorKind::ConstraintError).len(), 1);
    }

    #[test]
    fn test_nested_paths() {
        let schema = Schema::builder("User")
            .field(FieldDescriptor::nested("address", address_schema()))
            .build()
            .unwrap();

        let report = schema
            .validate(&map(json!({"address": {"city": "Paris", "zip": 75001}})))
            .unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].path, "address.zip");
        assert_eq!(report.errors()[0].kind, ErrorKind::TypeError);

        let report = schema.validate(&map(json!({"address": {}}))).unwrap_err();
        let paths: Vec<_> = report.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["address.city", "address.zip"]);
    }

    #[test]
    fn test_nested_non_object() {
        let schema = Schema::builder("User")
            .field(FieldDescriptor::nested("address", address_schema()))
            .build()
            .unwrap();

        let report = schema.validate(&map(json!({"address": "Paris"}))).unwrap_err();
        assert_eq!(report.errors()[0].path, "address");
        assert_eq!(report.errors()[0].message, "expected object for 'Address', got string");
    }

    #[test]
    fn test_sequence_paths() {
        let schema = Schema::builder("Order")
            .field(FieldDescriptor::sequence("quantities", FieldType::Integer))
            .field(FieldDescriptor::sequence("shipping", FieldType::nested(address_schema())))
            .build()
            .unwrap();

        let report = schema
            .validate(&map(json!({
                "quantities": [1, "two", 3, 4.5],
                "shipping": [{"city": "Lyon", "zip": "69001"}, {"city": "Nice", "zip": "06"}]
            })))
            .unwrap_err();

        let paths: Vec<_> = report.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["quantities[1]", "quantities[3]", "shipping[1].zip"]);
    }

    #[test]
    fn test_sequence_values_coerced() {
        let schema = Schema::builder("Series")
            .field(FieldDescriptor::sequence("points", FieldType::Float))
            .build()
            .unwrap();

        let record = schema.validate(&map(json!({"points": [1, 2.5]}))).unwrap();
        assert_eq!(record.get("points"), Some(&json!([1.0, 2.5])));
    }

    #[test]
    fn test_run_rejects_non_object_root() {
        let report = Engine::default().run(&user_schema(), &json!([1, 2])).unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].path, ROOT_PATH);
        assert_eq!(report.errors()[0].kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_unknown_fields_ignored_by_default() {
        let record = user_schema()
            .validate(&map(json!({"name": "John", "age": 30, "role": "admin"})))
            .unwrap();
        assert!(record.get("role").is_none());
    }

    #[test]
    fn test_unknown_fields_forbidden() {
        let engine = Engine::new(EngineConfig {
            unknown_fields: UnknownFieldPolicy::Forbid,
            ..EngineConfig::default()
        });

        let report = engine
            .run(&user_schema(), &json!({"name": "John", "age": 30, "role": "admin", "x": 1}))
            .unwrap_err();
        let paths: Vec<_> = report.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["role", "x"]);
        assert!(report.iter().all(|e| e.kind == ErrorKind::ExtraField));
    }

    #[test]
    fn test_integral_floats_config() {
        let strict = Engine::new(EngineConfig {
            accept_integral_floats: false,
            ..EngineConfig::default()
        });
        let input = json!({"name": "John", "age": 30.0});

        assert!(strict.run(&user_schema(), &input).is_err());
        let record = Engine::default().run(&user_schema(), &input).unwrap();
        assert_eq!(record.get("age"), Some(&json!(30)));
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let schema = Schema::builder("User")
            .field(FieldDescriptor::string("name").post_validator(crate::Trim))
            .field(FieldDescriptor::float("score"))
            .field(FieldDescriptor::nested("address", address_schema()))
            .field(FieldDescriptor::boolean("active").with_default(false))
            .build()
            .unwrap();

        let first = schema
            .validate(&map(json!({
                "name": " Ada ",
                "score": 9,
                "address": {"city": "Paris", "zip": "75001"}
            })))
            .unwrap();
        let second = schema.validate(first.as_map()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_paths_join() {
        assert_eq!(join_path("", "name"), "name");
        assert_eq!(join_path("address", "zip"), "address.zip");
        assert_eq!(index_path("tags", 2), "tags[2]");
        assert_eq!(join_path(&index_path("orders", 0), "sku"), "orders[0].sku");
    }
}
