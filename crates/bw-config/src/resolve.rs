//! Model file resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths →
//! system config → built-in preset.

use std::path::{Path, PathBuf};

/// Discovered model file path.
#[derive(Debug, Clone, Default)]
pub struct ModelPath {
    /// Path to the model file (or None when falling back to a preset).
    pub path: Option<PathBuf>,

    /// Where the path came from (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Selected with an explicit preset name.
    Preset,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/hmm-bw/.
    SystemConfig,

    /// Using the built-in default preset.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Preset => write!(f, "preset"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_MODEL_PATH: &str = "BW_MODEL";
pub const ENV_CONFIG_DIR: &str = "BW_CONFIG_DIR";

/// Standard model file names, in lookup order.
const MODEL_FILENAMES: [&str; 2] = ["model.json", "model.toml"];

/// Application name for XDG directories.
const APP_NAME: &str = "hmm-bw";

/// Resolve the model file path using the standard resolution order.
///
/// Resolution order:
/// 1. Explicit CLI path (returned even if missing, so the loader can report it)
/// 2. `BW_MODEL` environment variable
/// 3. `BW_CONFIG_DIR` environment variable + `model.json`/`model.toml`
/// 4. XDG config directory (~/.config/hmm-bw/)
/// 5. System config (/etc/hmm-bw/)
/// 6. Built-in default (None)
pub fn resolve_model_path(cli_path: Option<&Path>) -> ModelPath {
    if let Some(path) = cli_path {
        return ModelPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_MODEL_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ModelPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_model_file(Path::new(&config_dir)) {
            return ModelPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        if let Some(path) = find_model_file(&dir) {
            return ModelPath {
                path: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    if let Some(path) = find_model_file(&system_config_dir()) {
        return ModelPath {
            path: Some(path),
            source: ConfigSource::SystemConfig,
        };
    }

    ModelPath {
        path: None,
        source: ConfigSource::BuiltinDefault,
    }
}

/// First standard model file present in `dir`.
fn find_model_file(dir: &Path) -> Option<PathBuf> {
    MODEL_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Get the XDG config directory for hmm-bw.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(format!("{}", ConfigSource::Preset), "preset");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_cli_path_wins_even_if_missing() {
        let resolved = resolve_model_path(Some(Path::new("/nope/model.json")));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path, Some(PathBuf::from("/nope/model.json")));
    }

    #[test]
    fn test_find_model_file_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_model_file(dir.path()).is_none());

        std::fs::write(dir.path().join("model.toml"), "").unwrap();
        assert_eq!(
            find_model_file(dir.path()),
            Some(dir.path().join("model.toml"))
        );

        std::fs::write(dir.path().join("model.json"), "{}").unwrap();
        assert_eq!(
            find_model_file(dir.path()),
            Some(dir.path().join("model.json"))
        );
    }

    #[test]
    fn test_xdg_config_dir() {
        if let Some(path) = xdg_config_dir() {
            assert!(path.ends_with(APP_NAME));
        }
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/hmm-bw"));
    }
}
