//! Fuzz target for PaddleOCR regional label files.
//!
//! Run with:
//!   cargo +nightly fuzz run regional_label_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use ocrlabel::export::paddle::from_regional_json;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(entries) = from_regional_json(text) {
        for entry in entries {
            // Arbitrary polygons may be degenerate; that is an error, not a panic.
            let _ = entry.to_box();
        }
    }
});
