//! Model loading: resolve a source, parse it, validate it, snapshot it.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ModelSpec;
use crate::preset::{get_preset, PresetError, PresetName};
use crate::resolve::{resolve_model_path, ConfigSource};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_model, ValidationError};

/// Errors that can occur during model loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Model file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Could not load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Preset(#[from] PresetError),
}

impl From<ConfigError> for bw_common::Error {
    fn from(err: ConfigError) -> Self {
        match &err {
            ConfigError::NotFound { .. } => bw_common::Error::Config(err.to_string()),
            ConfigError::Load {
                source: ValidationError::IoError(_),
                ..
            } => bw_common::Error::Config(err.to_string()),
            ConfigError::Load { .. } | ConfigError::Validation(_) => {
                bw_common::Error::InvalidModel(err.to_string())
            }
            ConfigError::Preset(PresetError::UnknownPreset(name)) => {
                bw_common::Error::UnknownPreset(name.clone())
            }
        }
    }
}

/// Model loading options, usually filled from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
    /// Explicit model file (highest priority).
    pub model_path: Option<PathBuf>,
    /// Explicit preset, used when no model file is given.
    pub preset: Option<PresetName>,
    /// Skip stochasticity checks (the estimator tolerates any non-negative input).
    pub skip_validation: bool,
}

/// A model together with where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub spec: ModelSpec,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    pub snapshot: ConfigSnapshot,
}

/// Load the model with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit model path
/// 2. Explicit preset
/// 3. Environment / XDG / system model files
/// 4. The `weather` preset
pub fn load_model(options: &LoadOptions) -> Result<ResolvedModel, ConfigError> {
    let (spec, path, source) = match (&options.model_path, options.preset) {
        (Some(path), _) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
            let spec = read_model(path)?;
            (spec, Some(path.clone()), ConfigSource::CliArgument)
        }
        (None, Some(preset)) => (get_preset(preset), None, ConfigSource::Preset),
        (None, None) => {
            let resolved = resolve_model_path(None);
            match resolved.path {
                Some(path) => {
                    let spec = read_model(&path)?;
                    (spec, Some(path), resolved.source)
                }
                None => (
                    get_preset(PresetName::Weather),
                    None,
                    ConfigSource::BuiltinDefault,
                ),
            }
        }
    };

    if !options.skip_validation {
        validate_model(&spec)?;
    }

    let snapshot = ConfigSnapshot::new(&spec, path.as_deref(), source);
    Ok(ResolvedModel {
        spec,
        path,
        source,
        snapshot,
    })
}

fn read_model(path: &std::path::Path) -> Result<ModelSpec, ConfigError> {
    ModelSpec::from_file(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })
}
