//! Fuzz target for schema document compilation.
//!
//! Arbitrary documents must either compile or fail with a `SchemaError`,
//! never panic or loop on reference cycles.

#![no_main]

use libfuzzer_sys::fuzz_target;
use verity_validation::{SchemaDocument, SchemaSet};

fuzz_target!(|data: &[u8]| {
    if let Ok(document) = serde_json::from_slice::<SchemaDocument>(data) {
        if let Ok(set) = SchemaSet::from_document(&document) {
            for name in set.names() {
                assert!(set.get(name).is_some());
            }
        }
    }
});
