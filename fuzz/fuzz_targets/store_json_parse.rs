//! Fuzz target for project store parsing.
//!
//! Label records with partial or degenerate geometry must be rejected as
//! parse errors, never accepted and never a panic.
//!
//! Run with:
//!   cargo +nightly fuzz run store_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use ocrlabel::store::io_json::{from_json_str, to_json_string};

fuzz_target!(|data: &[u8]| {
    // Store files are small; larger inputs only slow the fuzzer down.
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(store) = from_json_str(text) {
        // Anything accepted must serialize again.
        let json = to_json_string(&store).expect("accepted store serializes");
        from_json_str(&json).expect("serialized store parses");
    }
});
