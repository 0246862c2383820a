//! Fuzz target for the response renderer.
//!
//! Run with: cargo +nightly fuzz run fuzz_render
//!
//! `render` must never panic, and must succeed exactly when the bytes are a
//! well-formed JSON document.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoded = serde_json::from_slice::<serde_json::Value>(data);
    let rendered = maestro_shell_core::render(data);
    assert_eq!(decoded.is_ok(), rendered.is_ok());
    if let Ok(text) = rendered {
        assert!(text.ends_with('\n'));
    }
});
