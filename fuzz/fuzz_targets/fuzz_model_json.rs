//! Fuzz target for JSON model file parsing and validation.
//!
//! Parsing and validation must only return errors, never panic. A model
//! that validates must also build an estimator.

#![no_main]

use bw_config::{validate_model, ModelSpec};
use bw_core::HmmEstimator;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(spec) = ModelSpec::from_json_str(text) {
        if validate_model(&spec).is_ok() {
            assert!(HmmEstimator::from_spec(&spec).is_ok());
        }
    }
});
