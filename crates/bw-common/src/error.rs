//! Error types for hmm-bw.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Invalid Observation Sequence
//!   Reason: invalid observation sequence: symbol 2 at position 3 is outside [0, 2)
//!   Fix: Every symbol must be an index into the emission matrix columns.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "input",
//!   "message": "invalid observation sequence: ...",
//!   "recoverable": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for hmm-bw operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Model files, presets, schema versions.
    Config,
    /// Observation sequences and command arguments.
    Input,
    /// Forward/backward/EM computation.
    Estimation,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Estimation => write!(f, "estimation"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for hmm-bw.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid model file: {0}")]
    InvalidModel(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    // Input errors (20-29)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid observation sequence: {0}")]
    InvalidObservation(String),

    // Estimation errors (30-39)
    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("numerical instability detected: {0}")]
    NumericalInstability(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Estimation errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidModel(_) => 11,
            Error::UnknownPreset(_) => 12,
            Error::InvalidArgument(_) => 20,
            Error::InvalidObservation(_) => 21,
            Error::InvalidParameter(_) => 30,
            Error::NumericalInstability(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidModel(_) | Error::UnknownPreset(_) => {
                ErrorCategory::Config
            }
            Error::InvalidArgument(_) | Error::InvalidObservation(_) => ErrorCategory::Input,
            Error::InvalidParameter(_) | Error::NumericalInstability(_) => {
                ErrorCategory::Estimation
            }
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the user can fix this by changing inputs.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Io(_))
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'bw-core check' to see which model file was resolved and why it was rejected."
            }
            Error::InvalidModel(_) => {
                "Each row of the transition and emission matrices, and the initial vector, must be non-negative and sum to 1."
            }
            Error::UnknownPreset(_) => "List the built-in models with 'bw-core presets'.",
            Error::InvalidArgument(_) => "See 'bw-core --help' for accepted arguments.",
            Error::InvalidObservation(_) => {
                "Every symbol must be an index into the emission matrix columns, e.g. --sequence 0,1,1,0,1."
            }
            Error::InvalidParameter(_) => {
                "Check that the transition matrix is square and the emission and initial tables have one row per state."
            }
            Error::NumericalInstability(_) => {
                "Parameters overflowed during training. Drop --no-validate and run 'bw-core check' on the model."
            }
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Serializing command output failed; please report this with the command line used.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidModel(_) => "Invalid Model File",
            Error::UnknownPreset(_) => "Unknown Preset",
            Error::InvalidArgument(_) => "Invalid Argument",
            Error::InvalidObservation(_) => "Invalid Observation Sequence",
            Error::InvalidParameter(_) => "Invalid Model Parameter",
            Error::NumericalInstability(_) => "Numerical Instability",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Serialization Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g. file path, symbol index).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context: HashMap::new(),
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
