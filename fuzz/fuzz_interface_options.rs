//! Fuzz target for `key=value` option parsing.
//!
//! Run with: cargo +nightly fuzz run fuzz_interface_options
//!
//! Splits arbitrary text into tokens the way the shell does and builds an
//! interface configuration from them. A successful build always names the
//! interface.

#![no_main]

use libfuzzer_sys::fuzz_target;
use maestro_shell_core::client::InterfaceConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = InterfaceConfig::from_options(line.split_whitespace()) {
        assert!(config.name.as_deref().is_some_and(|n| !n.is_empty()));
    }
});
