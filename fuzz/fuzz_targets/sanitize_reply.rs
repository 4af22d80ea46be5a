#![no_main]

use crow_relay::sanitize_reply;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let once = sanitize_reply(&raw);
    assert_eq!(sanitize_reply(&once), once);
    assert!(!once.contains('\n'));
    assert!(!once.contains("  "));
    assert_eq!(once.trim(), once);
});
