//! Run configuration and assembly.
//!
//! [`RunConfig`] collects everything one benchmark run needs: which backend
//! and generator to build, how big the cache is, how many workers to spawn,
//! and when to stop. [`RunConfig::build_parts`] turns a validated config into
//! the live backend + generator pair the driver consumes.
//!
//! The capacity field carries a unit flag rather than two fields: when
//! `is_item_capacity` is set, `capacity` counts entries; otherwise it counts
//! bytes and backends convert via their per-entry footprint.

use std::time::Duration;

use crate::backend::{self, CacheBackend, MemStats};
use crate::error::{BenchError, ConfigError};
use crate::generator::{GeneratorSpec, KeyGenerator};
use crate::trace::TraceRegistry;

/// Everything one benchmark run needs, before any resource is allocated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Label written to the report; distinguishes runs in one CSV file.
    pub run_name: String,
    /// Free-form tag column, e.g. a commit hash or host name.
    pub run_tag: String,
    /// Backend selector, see [`backend::build_backend`].
    pub backend: String,
    /// Generator selector, see [`GeneratorSpec::parse`].
    pub generator: String,
    /// Cache capacity, in entries or bytes depending on `is_item_capacity`.
    pub capacity: u64,
    pub is_item_capacity: bool,
    /// Worker thread count; each worker runs the full iteration budget.
    pub threads: usize,
    /// Per-worker iteration budget (outer batches, not individual keys).
    pub iterations: u64,
    /// Workers consult the clock / cancel flag every this many iterations.
    pub check_freq: u64,
    /// Wall-clock budget; the coordinator raises the cancel flag past it.
    pub time_limit: Duration,
    /// Miss-cost depth, see [`crate::payload::Payload`].
    pub payload_level: u32,
    /// Report-only tuning knobs, passed through to the CSV row.
    pub pull_threshold: f64,
    pub purge_threshold: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_name: String::new(),
            run_tag: String::new(),
            backend: "hash".to_string(),
            generator: "uniform".to_string(),
            capacity: 1,
            is_item_capacity: true,
            threads: 1,
            iterations: 1,
            check_freq: 1000,
            time_limit: Duration::from_secs(60),
            payload_level: 5,
            pull_threshold: 0.1,
            purge_threshold: 0.1,
        }
    }
}

impl RunConfig {
    /// Rejects configs that would stall, divide by zero, or allocate nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::new("capacity must be positive"));
        }
        if self.threads == 0 {
            return Err(ConfigError::new("thread count must be positive"));
        }
        if self.iterations == 0 {
            return Err(ConfigError::new("iteration count must be positive"));
        }
        if self.check_freq == 0 {
            return Err(ConfigError::new("check frequency must be positive"));
        }
        if self.time_limit.is_zero() {
            return Err(ConfigError::new("time limit must be positive"));
        }
        for (name, value) in [
            ("pull threshold", self.pull_threshold),
            ("purge threshold", self.purge_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::new(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Builds the backend and a generator prototype for this config.
    ///
    /// The generator's key-space ceiling is derived from the backend's final
    /// entry capacity, at 99% of it, so random workloads hover just under
    /// the cache size regardless of whether capacity was given in entries or
    /// bytes.
    pub fn build_parts(
        &self,
        registry: &TraceRegistry,
    ) -> Result<(Box<dyn CacheBackend>, Box<dyn KeyGenerator>), BenchError> {
        self.validate()?;
        let backend = backend::build_backend(&self.backend, self.capacity, self.is_item_capacity)?;
        let stats = backend.mem_stats();
        let spec = GeneratorSpec::parse(&self.generator, stats.capacity, derive_max_key(&stats))?;
        let generator = spec.build(registry, self.threads)?;
        Ok((backend, generator))
    }
}

/// 99% of the entry capacity, floored at 1 so tiny caches stay usable.
pub fn derive_max_key(stats: &MemStats) -> u64 {
    (stats.capacity / 100 * 99).max(1)
}
