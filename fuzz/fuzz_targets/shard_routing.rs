#![no_main]

use cachebench::backend::bucketed::route_key;
use libfuzzer_sys::fuzz_target;

// Fuzz shard routing across arbitrary keys and shard-count exponents
//
// Routing must stay inside the shard array and be stable for the same input.
fuzz_target!(|data: &[u8]| {
    if data.len() < 9 {
        return;
    }

    let key = u64::from_le_bytes(data[0..8].try_into().unwrap());
    let log_shards = u32::from(data[8] % 16);

    let shard = route_key(key, log_shards);
    assert!(shard < (1usize << log_shards));
    assert_eq!(shard, route_key(key, log_shards));
});
