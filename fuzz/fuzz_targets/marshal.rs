#![no_main]

use libfuzzer_sys::fuzz_target;
use rucksjoin::Marshal;

// Fuzz target for typed key decoding.
// Arbitrary bytes must decode or fail with an error, never panic, and
// anything that decodes must encode back to the same bytes.
fuzz_target!(|data: &[u8]| {
    if let Ok(key) = <(u8, u32, String)>::from_bytes(data) {
        assert_eq!(key.to_bytes(), data);
    }
    if let Ok(key) = <(i16, i64, Vec<u8>)>::from_bytes(data) {
        assert_eq!(key.to_bytes(), data);
    }
    if let Ok(value) = i32::from_bytes(data) {
        assert_eq!(value.to_bytes(), data);
    }
});
