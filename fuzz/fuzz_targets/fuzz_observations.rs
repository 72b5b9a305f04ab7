//! Fuzz target for `--sequence` parsing.
//!
//! Anything that parses must format back to a string that parses to the
//! same symbols.

#![no_main]

use bw_common::{format_observations, parse_observations};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(symbols) = parse_observations(text) {
        let rendered = format_observations(&symbols);
        assert_eq!(parse_observations(&rendered).ok(), Some(symbols));
    }
});
