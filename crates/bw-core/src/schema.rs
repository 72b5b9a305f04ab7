//! JSON Schema generation for model files and command payloads.
//!
//! ```bash
//! bw-core schema --list
//! bw-core schema ModelSpec
//! bw-core schema --all
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::report::{LatticeReport, SampleReport, TrainReport};
pub use bw_config::ModelSpec;

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ModelSpec", "Model file: initial A, B, π, labels and iteration budget"),
        ("TrainReport", "Output of `bw-core train`"),
        ("LatticeReport", "Output of `bw-core forward` / `bw-core backward`"),
        ("SampleReport", "Output of `bw-core sample`"),
    ]
}

/// Generate JSON Schema for a type by name, or `None` if unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "ModelSpec" => schema_for!(ModelSpec),
        "TrainReport" => schema_for!(TrainReport),
        "LatticeReport" => schema_for!(LatticeReport),
        "SampleReport" => schema_for!(SampleReport),
        _ => return None,
    };
    serde_json::to_value(schema).ok()
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}
