//! Fuzz target for the validation engine.
//!
//! Runs arbitrary JSON and structured records through a fixed schema. The
//! engine must never panic, and an accepted record must revalidate to itself.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use fixture::schema;
use serde_json::{Value, json};
use verity_validation::{Engine, EngineConfig, UnknownFieldPolicy};

mod fixture {
    use std::sync::{Arc, OnceLock};
    use verity_validation::{Constraint, FieldDescriptor, FieldType, Lowercase, Schema, Trim};

    static SCHEMA: OnceLock<Schema> = OnceLock::new();

    pub fn schema() -> &'static Schema {
        SCHEMA.get_or_init(|| {
            let address = Schema::builder("Address")
                .field(FieldDescriptor::string("zip").constraint(Constraint::min_length(5)))
                .build()
                .expect("address schema");

            Schema::builder("User")
                .field(FieldDescriptor::string("name").post_validator(Trim))
                .field(FieldDescriptor::email("email").post_validator(Lowercase))
                .field(
                    FieldDescriptor::integer("age")
                        .constraint(Constraint::greater_than(0))
                        .constraint(Constraint::multiple_of(1)),
                )
                .field(FieldDescriptor::float("score").with_default(0.0))
                .field(FieldDescriptor::boolean("active").with_default(false))
                .field(FieldDescriptor::nested("address", Arc::new(address)))
                .field(FieldDescriptor::sequence("tags", FieldType::String).with_default(Vec::<String>::new()))
                .build()
                .expect("user schema")
        })
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzRecord {
    name: Option<String>,
    email: Option<String>,
    age: Option<i64>,
    age_as_float: Option<f64>,
    score: Option<f64>,
    active: Option<bool>,
    zip: Option<String>,
    tags: Option<Vec<String>>,
    extra: Option<(String, String)>,
}

impl FuzzRecord {
    fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(name) = &self.name {
            map.insert("name".into(), json!(name));
        }
        if let Some(email) = &self.email {
            map.insert("email".into(), json!(email));
        }
        match (self.age, self.age_as_float) {
            (Some(age), _) => {
                map.insert("age".into(), json!(age));
            }
            (None, Some(age)) if age.is_finite() => {
                map.insert("age".into(), json!(age));
            }
            _ => {}
        }
        if let Some(score) = self.score.filter(|s| s.is_finite()) {
            map.insert("score".into(), json!(score));
        }
        if let Some(active) = self.active {
            map.insert("active".into(), json!(active));
        }
        if let Some(zip) = &self.zip {
            map.insert("address".into(), json!({ "zip": zip }));
        }
        if let Some(tags) = &self.tags {
            map.insert("tags".into(), json!(tags));
        }
        if let Some((key, value)) = &self.extra {
            map.entry(key.clone()).or_insert_with(|| json!(value));
        }
        Value::Object(map)
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Raw bytes to parse as a JSON record
    raw: Vec<u8>,
    /// Structured record close to the schema
    record: FuzzRecord,
    forbid_unknown: bool,
    accept_integral_floats: bool,
}

fn check(engine: &Engine, input: &Value) {
    if let Ok(record) = engine.run(schema(), input) {
        let again = engine
            .run(schema(), &Value::from(record.clone()))
            .expect("accepted record must revalidate");
        assert_eq!(record, again);
    }
}

fuzz_target!(|data: FuzzInput| {
    let engine = Engine::new(EngineConfig {
        unknown_fields: if data.forbid_unknown {
            UnknownFieldPolicy::Forbid
        } else {
            UnknownFieldPolicy::Ignore
        },
        accept_integral_floats: data.accept_integral_floats,
    });

    // Test 1: arbitrary JSON must never panic the engine
    if let Ok(s) = std::str::from_utf8(&data.raw) {
        if let Ok(value) = serde_json::from_str::<Value>(s) {
            check(&engine, &value);
        }
    }

    // Test 2: near-valid records exercise every pipeline stage
    check(&engine, &data.record.to_value());
});
