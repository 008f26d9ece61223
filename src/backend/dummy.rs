//! Always-miss backend: never stores anything.
//!
//! Measures the raw cost of the harness plus the payload producer, which makes
//! it the floor every real backend is compared against. It is also the
//! behavior a zero-capacity shard falls back to inside the bucketed adapter.

use super::{CacheBackend, MemStats, ProfileCounters, Value, ENTRY_BYTES};

/// Backend that forgets every value immediately.
///
/// Every request is a miss and invokes the producer exactly once; `count` in
/// [`MemStats`] is always zero.
#[derive(Debug, Default)]
pub struct DummyBackend {
    capacity: u64,
    total_mem: u64,
    profile: ProfileCounters,
}

impl DummyBackend {
    /// Creates a backend advertising the given capacity without ever using it.
    ///
    /// `capacity` is items when `is_item_capacity`, otherwise a byte budget
    /// converted at [`ENTRY_BYTES`] per entry.
    pub fn new(capacity: u64, is_item_capacity: bool) -> Self {
        let (items, bytes) = if is_item_capacity {
            (capacity, capacity * ENTRY_BYTES)
        } else {
            (capacity / ENTRY_BYTES, capacity)
        };
        Self {
            capacity: items,
            total_mem: bytes,
            profile: ProfileCounters::new(),
        }
    }
}

impl CacheBackend for DummyBackend {
    fn name(&self) -> String {
        "dummy".to_string()
    }

    fn consume_cached_or_compute(
        &self,
        _key: u64,
        producer: &mut dyn FnMut() -> Value,
    ) -> (bool, Value) {
        self.profile.record_find();
        (false, producer())
    }

    fn mem_stats(&self) -> MemStats {
        MemStats {
            capacity: self.capacity,
            total_mem: self.total_mem,
            count: 0,
        }
    }

    fn profile_stats(&self) -> super::ProfileStats {
        self.profile.snapshot()
    }

    fn reset_profiler(&self) {
        self.profile.reset();
    }

    fn release_memory(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_request_is_a_miss() {
        let backend = DummyBackend::new(100, true);
        let mut calls = 0;

        for key in 0..10 {
            let (hit, value) = backend.consume_cached_or_compute(key, &mut || {
                calls += 1;
                [7, key]
            });
            assert!(!hit);
            assert_eq!(value, [7, key]);
        }

        assert_eq!(calls, 10);
        assert_eq!(backend.mem_stats().count, 0);
        assert_eq!(backend.profile_stats().find, 10);
    }

    #[test]
    fn memory_budget_converts_to_item_capacity() {
        let backend = DummyBackend::new(240, false);
        assert_eq!(backend.mem_stats().capacity, 240 / ENTRY_BYTES);
        assert_eq!(backend.mem_stats().total_mem, 240);
    }
}
