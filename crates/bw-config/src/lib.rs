//! hmm-bw configuration loading and validation.
//!
//! This crate provides:
//! - The model file schema (JSON or TOML)
//! - Built-in presets
//! - Model resolution (CLI → env → XDG → system → preset)
//! - Shape and probability validation
//! - Config snapshots for reproducibility

pub mod load;
pub mod model;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use load::{load_model, ConfigError, LoadOptions, ResolvedModel};
pub use model::ModelSpec;
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_model_path, ConfigSource, ModelPath};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_model, ValidationError, ValidationResult};

/// Schema version for model files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
