//! Backend capability contract and reference backends.
//!
//! A *backend* is any key/value container under measurement. The driver only
//! ever talks to the [`CacheBackend`] trait, so eviction policy, locking
//! discipline, and storage layout stay opaque to the harness.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌────────────────────────────────────────┐
//!                 │           CacheBackend                 │
//!                 │                                        │
//!                 │  consume_cached_or_compute(key, prod)  │
//!                 │  mem_stats() / profile_stats()         │
//!                 │  reset_profiler() / release_memory()   │
//!                 └───────┬───────────────┬────────────────┘
//!                         │               │
//!           ┌─────────────┴───┐   ┌───────┴─────────────────────┐
//!           │  DummyBackend   │   │  HashFixedBackend           │
//!           │  (always miss)  │   │  (bounded map, no eviction) │
//!           └─────────────────┘   └─────────────────────────────┘
//!                         ▲
//!                         │ wraps 2^k of any of the above
//!           ┌─────────────┴───────────┐
//!           │  BucketedBackend<B>     │
//!           └─────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - [`CacheBackend`]: the fixed operation contract every backend honors.
//! - [`MemStats`] / [`ProfileStats`]: plain counters with a commutative,
//!   associative field-wise sum, so per-shard values fold in any order.
//! - [`ProfileCounters`]: relaxed atomic counters backends use internally so
//!   `&self` operations stay thread-safe.
//! - [`build_backend`]: name-based factory, failing fast on unknown names.
//!
//! ## Concurrency
//!
//! All trait methods other than `release_memory` take `&self`; a backend is
//! shared read-write across every worker thread for the duration of one run.
//! Whatever locking the backend does internally is its own business.

pub mod bucketed;
pub mod dummy;
pub mod hash_fixed;

pub use bucketed::BucketedBackend;
pub use dummy::DummyBackend;
pub use hash_fixed::HashFixedBackend;

use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ConfigError;

/// Value stored by every backend: `[payload, key]`.
///
/// Mirrors the fixed-width record the payload producer materializes; keeping
/// it `Copy` keeps the hot loop free of allocation.
pub type Value = [u64; 2];

/// Bytes one cached entry occupies (key + value), used to convert a memory
/// budget into an item capacity.
pub const ENTRY_BYTES: u64 = (std::mem::size_of::<u64>() + std::mem::size_of::<Value>()) as u64;

/// Shard count exponent used by the `b_*` bucketed backend names.
pub const DEFAULT_LOG_SHARDS: u32 = 6;

/// The fixed operation contract the harness requires from any container.
///
/// `consume_cached_or_compute` is the single hot-path operation: look up
/// `key`, and on a miss invoke `producer` **at most once** to materialize the
/// value, store it (if the backend chooses to), and return it either way.
/// The returned flag is `true` on a hit, i.e. when the producer was *not*
/// invoked.
pub trait CacheBackend: Send + Sync {
    /// Human-readable backend name used in reports.
    fn name(&self) -> String;

    /// Returns `(hit, value)`; invokes `producer` at most once, only on a miss.
    fn consume_cached_or_compute(
        &self,
        key: u64,
        producer: &mut dyn FnMut() -> Value,
    ) -> (bool, Value);

    /// Current capacity / memory / occupancy counters.
    fn mem_stats(&self) -> MemStats;

    /// Operation counters accumulated since the last [`reset_profiler`](Self::reset_profiler).
    fn profile_stats(&self) -> ProfileStats;

    /// Zeroes the profile counters; memory stats are unaffected.
    fn reset_profiler(&self);

    /// Drops all cached entries, returning the backend to its freshly
    /// constructed state.
    fn release_memory(&mut self);
}

/// Memory occupancy counters with a commutative field-wise sum.
///
/// # Example
///
/// ```
/// use cachebench::backend::MemStats;
///
/// let a = MemStats { capacity: 10, total_mem: 240, count: 3 };
/// let b = MemStats { capacity: 6, total_mem: 144, count: 1 };
/// assert_eq!(a + b, b + a);
/// assert_eq!((a + b).capacity, 16);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemStats {
    /// Maximum number of entries the backend will hold.
    pub capacity: u64,
    /// Memory budget in bytes backing that capacity.
    pub total_mem: u64,
    /// Entries currently resident.
    pub count: u64,
}

impl Add for MemStats {
    type Output = MemStats;

    fn add(mut self, rhs: MemStats) -> MemStats {
        self += rhs;
        self
    }
}

impl AddAssign for MemStats {
    fn add_assign(&mut self, rhs: MemStats) {
        self.capacity += rhs.capacity;
        self.total_mem += rhs.total_mem;
        self.count += rhs.count;
    }
}

/// Operation counters with a commutative field-wise sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    /// Lookups performed (hit or miss).
    pub find: u64,
    /// Values materialized and stored.
    pub insert: u64,
    /// Entries displaced to make room.
    pub evict: u64,
    /// Accesses that touched the backend's head structure, where it has one.
    pub head_accesses: u64,
}

impl Add for ProfileStats {
    type Output = ProfileStats;

    fn add(mut self, rhs: ProfileStats) -> ProfileStats {
        self += rhs;
        self
    }
}

impl AddAssign for ProfileStats {
    fn add_assign(&mut self, rhs: ProfileStats) {
        self.find += rhs.find;
        self.insert += rhs.insert;
        self.evict += rhs.evict;
        self.head_accesses += rhs.head_accesses;
    }
}

/// Relaxed atomic profile counters.
///
/// Counters are observational and never read mid-run by other threads, so
/// relaxed ordering is sufficient.
#[derive(Debug, Default)]
pub struct ProfileCounters {
    find: AtomicU64,
    insert: AtomicU64,
    evict: AtomicU64,
    head_accesses: AtomicU64,
}

impl ProfileCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_find(&self) {
        self.find.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_insert(&self) {
        self.insert.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_evict(&self) {
        self.evict.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_head_access(&self) {
        self.head_accesses.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the current counter values.
    pub fn snapshot(&self) -> ProfileStats {
        ProfileStats {
            find: self.find.load(Ordering::Relaxed),
            insert: self.insert.load(Ordering::Relaxed),
            evict: self.evict.load(Ordering::Relaxed),
            head_accesses: self.head_accesses.load(Ordering::Relaxed),
        }
    }

    /// Zeroes all counters.
    pub fn reset(&self) {
        self.find.store(0, Ordering::Relaxed);
        self.insert.store(0, Ordering::Relaxed);
        self.evict.store(0, Ordering::Relaxed);
        self.head_accesses.store(0, Ordering::Relaxed);
    }
}

/// Builds a backend by name.
///
/// Plain names construct a single instance; `b_`-prefixed names wrap the same
/// instance type in a [`BucketedBackend`] with `2^6` shards. Unknown names
/// fail fast before any worker starts.
///
/// # Example
///
/// ```
/// use cachebench::backend::build_backend;
///
/// let backend = build_backend("hash", 1000, true).unwrap();
/// assert_eq!(backend.mem_stats().capacity, 1000);
///
/// assert!(build_backend("frobnicate", 1000, true).is_err());
/// ```
pub fn build_backend(
    name: &str,
    capacity: u64,
    is_item_capacity: bool,
) -> Result<Box<dyn CacheBackend>, ConfigError> {
    match name {
        "dummy" => Ok(Box::new(DummyBackend::new(capacity, is_item_capacity))),
        "hash" => Ok(Box::new(HashFixedBackend::new(capacity, is_item_capacity))),
        "b_dummy" => Ok(Box::new(BucketedBackend::new(
            DEFAULT_LOG_SHARDS,
            capacity,
            is_item_capacity,
            DummyBackend::new,
        ))),
        "b_hash" => Ok(Box::new(BucketedBackend::new(
            DEFAULT_LOG_SHARDS,
            capacity,
            is_item_capacity,
            HashFixedBackend::new,
        ))),
        other => Err(ConfigError::new(format!("unknown backend: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_stats_sum_is_commutative() {
        let a = MemStats {
            capacity: 7,
            total_mem: 168,
            count: 2,
        };
        let b = MemStats {
            capacity: 3,
            total_mem: 72,
            count: 1,
        };
        assert_eq!(a + b, b + a);
    }

    #[test]
    fn profile_stats_sum_in_any_order() {
        let parts = [
            ProfileStats {
                find: 1,
                insert: 2,
                evict: 3,
                head_accesses: 4,
            },
            ProfileStats {
                find: 10,
                insert: 20,
                evict: 30,
                head_accesses: 40,
            },
            ProfileStats {
                find: 100,
                insert: 200,
                evict: 300,
                head_accesses: 400,
            },
        ];

        let forward = parts.iter().fold(ProfileStats::default(), |acc, &p| acc + p);
        let reverse = parts
            .iter()
            .rev()
            .fold(ProfileStats::default(), |acc, &p| acc + p);
        assert_eq!(forward, reverse);
        assert_eq!(forward.find, 111);
    }

    #[test]
    fn profile_counters_snapshot_and_reset() {
        let counters = ProfileCounters::new();
        counters.record_find();
        counters.record_find();
        counters.record_insert();

        let snap = counters.snapshot();
        assert_eq!(snap.find, 2);
        assert_eq!(snap.insert, 1);

        counters.reset();
        assert_eq!(counters.snapshot(), ProfileStats::default());
    }

    #[test]
    fn factory_rejects_unknown_names() {
        assert!(build_backend("lru", 10, true).is_err());
        assert!(build_backend("", 10, true).is_err());
    }

    #[test]
    fn factory_builds_bucketed_variants() {
        let backend = build_backend("b_hash", 1000, true).unwrap();
        assert_eq!(backend.mem_stats().capacity, 1000);
        assert!(backend.name().starts_with("binned_"));
    }
}
