// Verity - schema-driven structural validation for Rust
//
// Declare a record type as an ordered list of typed fields, then validate raw
// input against it. Every failure is collected into one report; a passing
// input comes back as a typed record.

// Re-export the validation engine
pub use verity_validation::*;

// Re-export logging
pub use verity_log as log;

// Re-export optional crates
#[cfg(feature = "config")]
pub use verity_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Constraint,
        Engine,
        EngineConfig,
        ErrorKind,
        FieldDescriptor,
        FieldType,
        Lowercase,
        PostValidator,
        Record,
        Schema,
        SchemaError,
        SchemaSet,
        Trim,
        UnknownFieldPolicy,
        ValidationError,
        ValidationErrors,
    };

    #[cfg(feature = "config")]
    pub use verity_config::{ConfigError, Settings, ValidationService};

    pub use serde_json::{Value, json};
}
