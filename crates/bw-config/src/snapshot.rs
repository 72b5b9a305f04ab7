//! Configuration snapshots for reproducibility.
//!
//! A snapshot captures which model a training run started from, so a result
//! can be traced back to its exact initial parameters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::model::ModelSpec;
use crate::resolve::ConfigSource;

/// A frozen snapshot of the resolved model configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the model.
    pub schema_version: String,

    /// Model name, if the file carries one.
    pub model_name: Option<String>,

    /// Path the model was loaded from.
    pub model_path: Option<String>,

    /// Source of the model configuration.
    pub model_source: String,

    /// SHA-256 of the model's canonical JSON form.
    pub model_hash: String,

    /// Number of hidden states.
    pub n_states: usize,

    /// Alphabet size.
    pub n_symbols: usize,
}

impl ConfigSnapshot {
    /// Create a new snapshot from a resolved model.
    pub fn new(spec: &ModelSpec, path: Option<&Path>, source: ConfigSource) -> Self {
        let canonical = serde_json::to_string(spec).unwrap_or_default();
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: spec.schema_version.clone(),
            model_name: spec.name.clone(),
            model_path: path.map(|p| p.display().to_string()),
            model_source: source.to_string(),
            model_hash: hash_content(&canonical),
            n_states: spec.n_states(),
            n_symbols: spec.n_symbols(),
        }
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.model_hash[..12.min(self.model_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
