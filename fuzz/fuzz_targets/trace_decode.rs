#![no_main]

use cachebench::trace::Trace;
use libfuzzer_sys::fuzz_target;

// Fuzz the binary trace decoder with arbitrary bytes
//
// The decoder must return an error for malformed input, never panic, and any
// trace it does accept must be internally consistent.
fuzz_target!(|data: &[u8]| {
    if let Ok(trace) = Trace::decode(data) {
        // Version 2 decodes enforce the declared total; version 1 has no
        // cross-check, so only structural consistency can be asserted here.
        let version = u64::from_le_bytes(data[0..8].try_into().unwrap());
        let record_count = u64::from_le_bytes(data[8..16].try_into().unwrap());
        assert_eq!(trace.requests.len() as u64, record_count);
        if version == 2 {
            let declared = u64::from_le_bytes(data[16..24].try_into().unwrap());
            assert_eq!(trace.request_count(), declared);
        }
    }
});
