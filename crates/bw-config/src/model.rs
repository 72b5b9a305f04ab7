//! Model file schema.
//!
//! A model file carries the initial guesses for one training run: the
//! transition matrix, the emission matrix, the initial-state distribution,
//! optional human labels for states and symbols, and an optional default
//! iteration budget. Files are JSON unless the extension is `.toml`.
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "name": "weather",
//!   "states": ["Rainy", "Sunny"],
//!   "symbols": ["Walk", "Shop"],
//!   "transition": [[0.7, 0.3], [0.4, 0.6]],
//!   "emission": [[0.1, 0.9], [0.6, 0.4]],
//!   "initial": [0.6, 0.4],
//!   "iterations": 30
//! }
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::ValidationError;

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

/// Initial HMM parameters plus presentation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    /// Schema version of this file.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Short model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional labels, one per hidden state.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<String>,

    /// Optional labels, one per observable symbol.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,

    /// Transition matrix A, N×N. Entry \[i\]\[j\] = P(next = j | current = i).
    pub transition: Vec<Vec<f64>>,

    /// Emission matrix B, N×M. Entry \[i\]\[k\] = P(symbol k | state i).
    pub emission: Vec<Vec<f64>>,

    /// Initial state distribution π, length N.
    pub initial: Vec<f64>,

    /// Default number of EM iterations when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
}

impl ModelSpec {
    /// Load a model from a JSON or TOML file (chosen by extension).
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        if is_toml_path(path) {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse a model from a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, ValidationError> {
        toml::from_str(text)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Number of hidden states (rows of the transition matrix).
    pub fn n_states(&self) -> usize {
        self.transition.len()
    }

    /// Size of the symbol alphabet (columns of the emission matrix).
    pub fn n_symbols(&self) -> usize {
        self.emission.first().map(Vec::len).unwrap_or(0)
    }

    /// Label for state `i`, falling back to `S{i}`.
    pub fn state_label(&self, i: usize) -> String {
        self.states
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("S{}", i))
    }

    /// Label for symbol `k`, falling back to the index itself.
    pub fn symbol_label(&self, k: usize) -> String {
        self.symbols
            .get(k)
            .cloned()
            .unwrap_or_else(|| k.to_string())
    }
}

/// True when the path should be parsed as TOML.
pub fn is_toml_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}
