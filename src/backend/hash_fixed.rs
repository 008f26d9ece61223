//! Bounded hash-map backend with no eviction.
//!
//! Stores values until its capacity is full, then keeps serving what it has
//! and recomputes everything else. With no eviction policy in the picture it
//! isolates lookup/insert cost, which is what the harness wants from a
//! reference backend.
//!
//! ## Concurrency
//!
//! A single `parking_lot::RwLock` guards the map. The lookup path takes the
//! read lock; the producer runs outside any lock so a slow producer never
//! serializes other workers. Two threads missing on the same key may both
//! invoke their own producer; each producer is still invoked at most once.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{CacheBackend, MemStats, ProfileCounters, ProfileStats, Value, ENTRY_BYTES};

/// Fixed-capacity hash map behind the backend contract.
#[derive(Debug)]
pub struct HashFixedBackend {
    map: RwLock<FxHashMap<u64, Value>>,
    capacity: u64,
    total_mem: u64,
    profile: ProfileCounters,
}

impl HashFixedBackend {
    /// Creates a backend with the given capacity.
    ///
    /// `capacity` is items when `is_item_capacity`, otherwise a byte budget
    /// converted at [`ENTRY_BYTES`] per entry. A zero capacity behaves as an
    /// always-miss backend.
    pub fn new(capacity: u64, is_item_capacity: bool) -> Self {
        let (items, bytes) = if is_item_capacity {
            (capacity, capacity * ENTRY_BYTES)
        } else {
            (capacity / ENTRY_BYTES, capacity)
        };
        Self {
            map: RwLock::new(FxHashMap::with_capacity_and_hasher(
                items.min(1 << 24) as usize,
                Default::default(),
            )),
            capacity: items,
            total_mem: bytes,
            profile: ProfileCounters::new(),
        }
    }
}

impl CacheBackend for HashFixedBackend {
    fn name(&self) -> String {
        "hash_fixed".to_string()
    }

    fn consume_cached_or_compute(
        &self,
        key: u64,
        producer: &mut dyn FnMut() -> Value,
    ) -> (bool, Value) {
        self.profile.record_find();

        if let Some(value) = self.map.read().get(&key) {
            return (true, *value);
        }

        // Miss: materialize outside the lock, then store if there is room.
        let value = producer();

        let mut map = self.map.write();
        if (map.len() as u64) < self.capacity {
            map.entry(key).or_insert(value);
            self.profile.record_insert();
        }

        (false, value)
    }

    fn mem_stats(&self) -> MemStats {
        MemStats {
            capacity: self.capacity,
            total_mem: self.total_mem,
            count: self.map.read().len() as u64,
        }
    }

    fn profile_stats(&self) -> ProfileStats {
        self.profile.snapshot()
    }

    fn reset_profiler(&self) {
        self.profile.reset();
    }

    fn release_memory(&mut self) {
        self.map.write().clear();
    }
}
