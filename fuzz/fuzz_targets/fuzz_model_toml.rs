//! Fuzz target for TOML model file parsing.

#![no_main]

use bw_config::{validate_model, ModelSpec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(spec) = ModelSpec::from_toml_str(text) {
            let _ = validate_model(&spec);
        }
    }
});
