//! Built-in starting models.
//!
//! Provides initial guesses for:
//! - Weather: two weather states observed through a person's activity
//! - Coin: a fair coin and a biased coin swapped behind a curtain
//! - Casino: the classic fair/loaded die

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ModelSpec;

/// Available model presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Rainy/Sunny states, Walk/Shop symbols
    Weather,
    /// Fair/Biased coin, Heads/Tails symbols
    Coin,
    /// Fair/Loaded die, six faces
    Casino,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Weather, PresetName::Coin, PresetName::Casino];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Weather => "weather",
            PresetName::Coin => "coin",
            PresetName::Casino => "casino",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "weather" | "default" => Some(PresetName::Weather),
            "coin" | "coins" => Some(PresetName::Coin),
            "casino" | "dice" | "die" => Some(PresetName::Casino),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Weather => "Two hidden weather states (Rainy, Sunny) seen through Walk/Shop",
            PresetName::Coin => "A fair and a biased coin switched between tosses",
            PresetName::Casino => "A dealer switching between a fair and a loaded six-sided die",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}

/// Get the model for a preset.
pub fn get_preset(name: PresetName) -> ModelSpec {
    match name {
        PresetName::Weather => weather_preset(),
        PresetName::Coin => coin_preset(),
        PresetName::Casino => casino_preset(),
    }
}

/// The default starting point used when nothing else is configured.
fn weather_preset() -> ModelSpec {
    ModelSpec {
        schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
        name: Some("weather".to_string()),
        description: Some(PresetName::Weather.description().to_string()),
        states: vec!["Rainy".to_string(), "Sunny".to_string()],
        symbols: vec!["Walk".to_string(), "Shop".to_string()],
        transition: vec![vec![0.7, 0.3], vec![0.4, 0.6]],
        emission: vec![vec![0.1, 0.9], vec![0.6, 0.4]],
        initial: vec![0.6, 0.4],
        iterations: Some(30),
    }
}

fn coin_preset() -> ModelSpec {
    ModelSpec {
        schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
        name: Some("coin".to_string()),
        description: Some(PresetName::Coin.description().to_string()),
        states: vec!["Fair".to_string(), "Biased".to_string()],
        symbols: vec!["Heads".to_string(), "Tails".to_string()],
        transition: vec![vec![0.9, 0.1], vec![0.2, 0.8]],
        emission: vec![vec![0.5, 0.5], vec![0.8, 0.2]],
        initial: vec![0.5, 0.5],
        iterations: Some(50),
    }
}

fn casino_preset() -> ModelSpec {
    let fair = vec![1.0 / 6.0; 6];
    // Loaded die lands on six half the time.
    let loaded = vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.5];
    ModelSpec {
        schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
        name: Some("casino".to_string()),
        description: Some(PresetName::Casino.description().to_string()),
        states: vec!["Fair".to_string(), "Loaded".to_string()],
        symbols: (1..=6).map(|face| face.to_string()).collect(),
        transition: vec![vec![0.95, 0.05], vec![0.1, 0.9]],
        emission: vec![fair, loaded],
        initial: vec![0.5, 0.5],
        iterations: Some(100),
    }
}

/// Summary information about a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub states: Vec<String>,
    pub symbols: Vec<String>,
    pub iterations: Option<usize>,
}

impl PresetInfo {
    /// Create info from a preset.
    pub fn from_preset(name: PresetName) -> Self {
        let spec = get_preset(name);
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            states: spec.states,
            symbols: spec.symbols,
            iterations: spec.iterations,
        }
    }
}

/// List all presets with their info.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|name| PresetInfo::from_preset(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_name_parse() {
        assert_eq!(PresetName::parse("weather"), Some(PresetName::Weather));
        assert_eq!(PresetName::parse("DICE"), Some(PresetName::Casino));
        assert_eq!(PresetName::parse("coins"), Some(PresetName::Coin));
        assert_eq!(PresetName::parse("roulette"), None);
    }

    #[test]
    fn test_preset_from_str_error_lists_names() {
        let err = "roulette".parse::<PresetName>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("roulette"));
        assert!(msg.contains("weather, coin, casino"));
    }

    #[test]
    fn test_weather_matches_reference_guess() {
        let spec = get_preset(PresetName::Weather);
        assert_eq!(spec.transition, vec![vec![0.7, 0.3], vec![0.4, 0.6]]);
        assert_eq!(spec.emission, vec![vec![0.1, 0.9], vec![0.6, 0.4]]);
        assert_eq!(spec.initial, vec![0.6, 0.4]);
    }

    #[test]
    fn test_casino_shape() {
        let spec = get_preset(PresetName::Casino);
        assert_eq!(spec.n_states(), 2);
        assert_eq!(spec.n_symbols(), 6);
        assert_eq!(spec.symbol_label(5), "6");
    }

    #[test]
    fn test_list_presets() {
        let presets = list_presets();
        assert_eq!(presets.len(), 3);
        assert!(presets.iter().any(|p| p.name == "coin"));
        assert_eq!(presets[0].states, vec!["Rainy", "Sunny"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(PresetName::Casino.to_string(), "casino");
    }
}
