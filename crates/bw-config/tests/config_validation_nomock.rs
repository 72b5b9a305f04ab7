//! No-mock model loading + resolution tests.
//!
//! Covers:
//! - Model validation against real files on disk (JSON and TOML)
//! - Resolution order (CLI > preset > env > config dir > XDG)
//! - Preset determinism

use bw_config::preset::{get_preset, list_presets, PresetName};
use bw_config::resolve::{resolve_model_path, ConfigSource, ENV_CONFIG_DIR, ENV_MODEL_PATH};
use bw_config::validate::{validate_model, ValidationError};
use bw_config::{load_model, ConfigError, LoadOptions, ModelSpec};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const VALID_MODEL_JSON: &str = r#"{
  "schema_version": "1.0.0",
  "name": "fixture",
  "states": ["Hot", "Cold"],
  "symbols": ["1", "2", "3"],
  "transition": [[0.6, 0.4], [0.5, 0.5]],
  "emission": [[0.2, 0.4, 0.4], [0.5, 0.4, 0.1]],
  "initial": [0.8, 0.2],
  "iterations": 12
}"#;

const VALID_MODEL_TOML: &str = r#"
name = "fixture-toml"
transition = [[0.6, 0.4], [0.5, 0.5]]
emission = [[0.2, 0.4, 0.4], [0.5, 0.4, 0.1]]
initial = [0.8, 0.2]
"#;

const BAD_SUM_JSON: &str = r#"{
  "transition": [[0.6, 0.6], [0.5, 0.5]],
  "emission": [[0.5, 0.5], [0.5, 0.5]],
  "initial": [0.5, 0.5]
}"#;

const BAD_SHAPE_JSON: &str = r#"{
  "transition": [[0.6, 0.4], [0.5, 0.5]],
  "emission": [[0.5, 0.5]],
  "initial": [0.5, 0.5]
}"#;

const ENV_KEYS: &[&str] = &[ENV_MODEL_PATH, ENV_CONFIG_DIR, "XDG_CONFIG_HOME"];

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

fn write_model(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir).expect("create model dir");
    let path = dir.join(name);
    fs::write(&path, content).expect("write model");
    path
}

#[test]
fn test_validate_json_model_file_ok() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_model(temp.path(), "model.json", VALID_MODEL_JSON);
    let spec = ModelSpec::from_file(&path).expect("read model");
    validate_model(&spec).expect("valid model should pass validation");
    assert_eq!(spec.n_states(), 2);
    assert_eq!(spec.n_symbols(), 3);
    assert_eq!(spec.iterations, Some(12));
}

#[test]
fn test_validate_toml_model_file_ok() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_model(temp.path(), "model.toml", VALID_MODEL_TOML);
    let spec = ModelSpec::from_file(&path).expect("read model");
    validate_model(&spec).expect("valid model should pass validation");
    assert_eq!(spec.name.as_deref(), Some("fixture-toml"));
}

#[test]
fn test_validate_rejects_bad_sum() {
    let spec = ModelSpec::from_json_str(BAD_SUM_JSON).expect("parse");
    let err = validate_model(&spec).expect_err("bad sum should fail validation");
    assert!(matches!(err, ValidationError::SemanticError(_)));
}

#[test]
fn test_validate_rejects_bad_shape() {
    let spec = ModelSpec::from_json_str(BAD_SHAPE_JSON).expect("parse");
    let err = validate_model(&spec).expect_err("bad shape should fail validation");
    assert!(matches!(err, ValidationError::ShapeError(_)));
}

#[test]
fn test_resolve_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let cli_path = write_model(&temp.path().join("cli"), "model.json", VALID_MODEL_JSON);
        let env_path = write_model(&temp.path().join("env"), "model.json", VALID_MODEL_JSON);
        env::set_var(ENV_MODEL_PATH, env_path.display().to_string());

        let resolved = resolve_model_path(Some(&cli_path));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.unwrap(), cli_path);
    });
}

#[test]
fn test_resolve_env_over_config_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let env_path = write_model(&temp.path().join("env"), "model.json", VALID_MODEL_JSON);
        let config_dir = temp.path().join("config_dir");
        write_model(&config_dir, "model.json", VALID_MODEL_JSON);

        env::set_var(ENV_MODEL_PATH, env_path.display().to_string());
        env::set_var(ENV_CONFIG_DIR, config_dir.display().to_string());

        let resolved = resolve_model_path(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path.unwrap(), env_path);
    });
}

#[test]
fn test_resolve_config_dir_toml() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let config_dir = temp.path().join("config_dir");
        let toml_path = write_model(&config_dir, "model.toml", VALID_MODEL_TOML);
        env::set_var(ENV_CONFIG_DIR, config_dir.display().to_string());

        let resolved = resolve_model_path(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path.unwrap(), toml_path);
    });
}

#[test]
fn test_resolve_xdg_fallback() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let xdg_dir = temp.path().join("xdg");
        let model_path = write_model(&xdg_dir.join("hmm-bw"), "model.json", VALID_MODEL_JSON);
        env::set_var("XDG_CONFIG_HOME", xdg_dir.display().to_string());

        // dirs honours XDG_CONFIG_HOME on Linux only.
        if cfg!(target_os = "linux") {
            let resolved = resolve_model_path(None);
            assert_eq!(resolved.source, ConfigSource::XdgConfig);
            assert_eq!(resolved.path.unwrap(), model_path);
        }
    });
}

#[test]
fn test_load_model_preset_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let env_path = write_model(temp.path(), "model.json", VALID_MODEL_JSON);
        env::set_var(ENV_MODEL_PATH, env_path.display().to_string());

        let resolved = load_model(&LoadOptions {
            preset: Some(PresetName::Casino),
            ..Default::default()
        })
        .expect("load preset");
        assert_eq!(resolved.source, ConfigSource::Preset);
        assert_eq!(resolved.spec.n_symbols(), 6);

        let from_env = load_model(&LoadOptions::default()).expect("load env model");
        assert_eq!(from_env.source, ConfigSource::Environment);
        assert_eq!(from_env.spec.name.as_deref(), Some("fixture"));
        assert_eq!(from_env.snapshot.n_symbols, 3);
    });
}

#[test]
fn test_load_model_rejects_invalid_env_model() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let env_path = write_model(temp.path(), "model.json", BAD_SUM_JSON);
        env::set_var(ENV_MODEL_PATH, env_path.display().to_string());

        let err = load_model(&LoadOptions::default()).expect_err("invalid model");
        assert!(matches!(err, ConfigError::Validation(_)));
    });
}

#[test]
fn test_presets_are_deterministic() {
    let first = get_preset(PresetName::Casino);
    let second = get_preset(PresetName::Casino);
    let first_json = serde_json::to_string(&first).expect("serialize preset");
    let second_json = serde_json::to_string(&second).expect("serialize preset");
    assert_eq!(first_json, second_json);

    let presets = list_presets();
    assert!(presets.iter().any(|p| p.name == PresetName::Casino.as_str()));
}
