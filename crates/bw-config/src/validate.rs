//! Configuration validation errors and semantic validation.
//!
//! The estimator itself tolerates non-stochastic input; this is where model
//! files are held to the probability constraints before training.

use thiserror::Error;

use crate::model::ModelSpec;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Tolerance for row sums of probability tables.
pub const STOCHASTIC_TOLERANCE: f64 = 1e-6;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Shape error: {0}")]
    ShapeError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

/// Validate a model file: version, shapes, entry ranges, row sums, labels.
pub fn validate_model(spec: &ModelSpec) -> ValidationResult<()> {
    if spec.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: spec.schema_version.clone(),
        });
    }

    let n = spec.n_states();
    if n == 0 {
        return Err(ValidationError::ShapeError(
            "transition matrix has no rows".to_string(),
        ));
    }
    validate_shape("transition", &spec.transition, n, n)?;

    let m = spec.n_symbols();
    if m == 0 {
        return Err(ValidationError::ShapeError(
            "emission matrix has no columns".to_string(),
        ));
    }
    validate_shape("emission", &spec.emission, n, m)?;

    if spec.initial.len() != n {
        return Err(ValidationError::ShapeError(format!(
            "initial has {} entries, expected {} (one per state)",
            spec.initial.len(),
            n
        )));
    }

    for (i, row) in spec.transition.iter().enumerate() {
        validate_distribution(&format!("transition[{}]", i), row)?;
    }
    for (i, row) in spec.emission.iter().enumerate() {
        validate_distribution(&format!("emission[{}]", i), row)?;
    }
    validate_distribution("initial", &spec.initial)?;

    if !spec.states.is_empty() && spec.states.len() != n {
        return Err(ValidationError::InvalidValue {
            field: "states".to_string(),
            message: format!("{} labels for {} states", spec.states.len(), n),
        });
    }
    if !spec.symbols.is_empty() && spec.symbols.len() != m {
        return Err(ValidationError::InvalidValue {
            field: "symbols".to_string(),
            message: format!("{} labels for {} symbols", spec.symbols.len(), m),
        });
    }

    Ok(())
}

fn validate_shape(
    name: &str,
    rows: &[Vec<f64>],
    expected_rows: usize,
    expected_cols: usize,
) -> ValidationResult<()> {
    if rows.len() != expected_rows {
        return Err(ValidationError::ShapeError(format!(
            "{} has {} rows, expected {}",
            name,
            rows.len(),
            expected_rows
        )));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != expected_cols {
            return Err(ValidationError::ShapeError(format!(
                "{}[{}] has {} columns, expected {}",
                name,
                i,
                row.len(),
                expected_cols
            )));
        }
    }
    Ok(())
}

/// Entries must be finite and non-negative and sum to 1.
fn validate_distribution(field: &str, values: &[f64]) -> ValidationResult<()> {
    for (k, v) in values.iter().enumerate() {
        if !v.is_finite() || *v < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: format!("{}[{}]", field, k),
                message: format!("Must be a finite probability >= 0, got {}", v),
            });
        }
    }
    if !bw_math::is_probability_vector(values, STOCHASTIC_TOLERANCE) {
        let sum: f64 = values.iter().sum();
        return Err(ValidationError::SemanticError(format!(
            "{} must sum to 1.0, got {}",
            field, sum
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{get_preset, PresetName};

    fn weather() -> ModelSpec {
        get_preset(PresetName::Weather)
    }

    #[test]
    fn presets_are_valid() {
        for name in PresetName::ALL {
            validate_model(&get_preset(*name)).unwrap();
        }
    }

    #[test]
    fn rejects_version_mismatch() {
        let mut spec = weather();
        spec.schema_version = "0.9.0".to_string();
        assert!(matches!(
            validate_model(&spec),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn rejects_non_square_transition() {
        let mut spec = weather();
        spec.transition[1] = vec![0.2, 0.3, 0.5];
        let err = validate_model(&spec).unwrap_err();
        assert!(matches!(err, ValidationError::ShapeError(_)));
    }

    #[test]
    fn rejects_emission_row_count() {
        let mut spec = weather();
        spec.emission.pop();
        assert!(matches!(
            validate_model(&spec),
            Err(ValidationError::ShapeError(_))
        ));
    }

    #[test]
    fn rejects_initial_length() {
        let mut spec = weather();
        spec.initial = vec![1.0];
        assert!(matches!(
            validate_model(&spec),
            Err(ValidationError::ShapeError(_))
        ));
    }

    #[test]
    fn rejects_row_not_summing_to_one() {
        let mut spec = weather();
        spec.transition[0] = vec![0.7, 0.4];
        let err = validate_model(&spec).unwrap_err();
        assert!(matches!(err, ValidationError::SemanticError(_)));
        assert!(err.to_string().contains("transition[0]"));
    }

    #[test]
    fn rejects_negative_entry() {
        let mut spec = weather();
        spec.emission[1] = vec![1.2, -0.2];
        match validate_model(&spec).unwrap_err() {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "emission[1][1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_nan_entry() {
        let mut spec = weather();
        spec.initial = vec![f64::NAN, 1.0];
        assert!(matches!(
            validate_model(&spec),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let mut spec = weather();
        spec.symbols = vec!["Walk".to_string()];
        assert!(matches!(
            validate_model(&spec),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn accepts_missing_labels() {
        let mut spec = weather();
        spec.states.clear();
        spec.symbols.clear();
        validate_model(&spec).unwrap();
    }

    #[test]
    fn rejects_empty_model() {
        let mut spec = weather();
        spec.transition.clear();
        assert!(matches!(
            validate_model(&spec),
            Err(ValidationError::ShapeError(_))
        ));
    }
}
