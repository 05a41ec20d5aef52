//! Fuzz target for the YAML engine config.
//!
//! Run with:
//!   cargo +nightly fuzz run engine_config_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use ocrlabel::detect::EngineConfig;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = EngineConfig::from_yaml_str(text);
    }
});
