//! Structural validation engine for Verity
//!
//! Schemas are ordered lists of typed field descriptors. Every field runs the
//! same pipeline: presence/default resolution, type coercion, constraints (all
//! failures collected), post-validators (first failure stops the chain). The
//! engine never stops at the first failing field; it returns either a
//! validated record or a report of every failure.
//!
//! # Examples
//!
//! ## Building and Running a Schema
//!
//! ```
//! use verity_validation::{Constraint, ErrorKind, FieldDescriptor, Schema};
//! use serde_json::json;
//!
//! let user = Schema::builder("User")
//!     .field(FieldDescriptor::string("name"))
//!     .field(
//!         FieldDescriptor::integer("age")
//!             .constraint(Constraint::greater_than(0).with_message("{value} should be greater than zero")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let input = json!({"name": "John", "age": -1});
//! let report = user.validate(input.as_object().unwrap()).unwrap_err();
//! assert_eq!(report.render(), "age: -1 should be greater than zero [kind=ConstraintError]");
//! assert_eq!(report.errors()[0].kind, ErrorKind::ConstraintError);
//!
//! let input = json!({"name": "John", "age": 30});
//! let record = user.validate(input.as_object().unwrap()).unwrap();
//! assert_eq!(record.get("age"), Some(&json!(30)));
//! ```
//!
//! ## Nested Schemas and Post-validators
//!
//! ```
//! use verity_validation::{Engine, FieldDescriptor, FieldType, Schema, Trim};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let address = Arc::new(
//!     Schema::builder("Address")
//!         .field(FieldDescriptor::string("zip"))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let user = Schema::builder("User")
//!     .field(FieldDescriptor::string("name").post_validator(Trim))
//!     .field(FieldDescriptor::nested("address", address))
//!     .field(FieldDescriptor::sequence("tags", FieldType::String))
//!     .build()
//!     .unwrap();
//!
//! let report = Engine::default()
//!     .run(&user, &json!({"name": " Ada ", "address": {"zip": 75001}, "tags": ["a", 2]}))
//!     .unwrap_err();
//! let paths: Vec<_> = report.iter().map(|e| e.path.as_str()).collect();
//! assert_eq!(paths, vec!["address.zip", "tags[1]"]);
//! ```
//!
//! ## Schema Documents
//!
//! ```
//! use verity_validation::{SchemaDocument, SchemaSet};
//! use serde_json::json;
//!
//! let document: SchemaDocument = serde_json::from_value(json!({
//!     "schemas": [{
//!         "name": "Point",
//!         "fields": [
//!             {"name": "x", "type": "float"},
//!             {"name": "y", "type": "float", "default": 0.0}
//!         ]
//!     }]
//! }))
//! .unwrap();
//!
//! let set = SchemaSet::from_document(&document).unwrap();
//! let record = set.get("Point").unwrap().validate(json!({"x": 1}).as_object().unwrap()).unwrap();
//! assert_eq!(record.get("x"), Some(&json!(1.0)));
//! ```

mod constraints;
mod document;
mod engine;
mod errors;
mod field;
mod schema;
mod types;
mod validators;

pub use constraints::*;
pub use document::*;
pub use engine::*;
pub use errors::*;
pub use field::*;
pub use schema::*;
pub use types::*;
pub use validators::*;
