//! Parallel benchmark driver.
//!
//! ## Architecture
//!
//! ```text
//!                    +-----------------------------+
//!                    |         driver::run         |
//!                    +-----------------------------+
//!                       | spawn N scoped workers
//!          +------------+------------+------------+
//!          v            v            v            v
//!     worker 0     worker 1     worker 2  ...  worker N-1
//!    (coordinator)     |            |            |
//!          |           |            |            |
//!          +---- Barrier::wait (synchronized start) ----+
//!          |           |            |            |
//!     records t0   .. run loop: batch -> lookup/produce ..
//!          |           |            |            |
//!     every check_freq iterations:               |
//!       t0.elapsed() > limit?   cancel flag raised?
//!          |           |            |            |
//!          +---- fetch_add totals, join ---------+
//! ```
//!
//! Worker 0 is the only clock reader and the only writer of the cancel flag;
//! every other worker polls the flag at the same cadence. All cross-thread
//! traffic (the flag, the merged totals) is relaxed atomics: a worker may
//! overrun the deadline by at most `check_freq` iterations, and the merged
//! totals are only read after every worker has joined.
//!
//! Each worker drives its own clone of the generator prototype, re-seeded
//! with the worker id, so runs are reproducible for a fixed thread count.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use crate::backend::CacheBackend;
use crate::config::RunConfig;
use crate::generator::KeyGenerator;
use crate::payload::Payload;

/// Merged outcome of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunResult {
    /// Outer iterations completed, summed over all workers.
    pub iterations: u64,
    /// Cache hits observed, summed over all workers.
    pub hits: u64,
    /// Wall-clock span from worker 0's post-barrier start to the last join.
    pub duration: Duration,
    pub threads: usize,
}

impl RunResult {
    /// Iterations per second across the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.iterations as f64 / secs
        }
    }

    /// Iterations per second contributed by an average worker.
    pub fn thread_throughput(&self) -> f64 {
        if self.threads == 0 {
            0.0
        } else {
            self.throughput() / self.threads as f64
        }
    }

    /// Hits per iteration. Batches longer than one key can push this past 1.
    pub fn hit_rate(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.hits as f64 / self.iterations as f64
        }
    }
}

/// Runs the configured workload against `backend` and merges worker totals.
///
/// Every worker receives an independent clone of `prototype`, re-seeded via
/// [`KeyGenerator::set_thread`], then loops: draw a batch, look up each key,
/// produce the value on a miss, and verify the response against the expected
/// payload. The loop ends when the per-worker iteration budget is spent or
/// the cancel flag is observed.
pub fn run(
    backend: &dyn CacheBackend,
    prototype: &dyn KeyGenerator,
    config: &RunConfig,
) -> RunResult {
    let payload = Payload::new(config.payload_level);
    // Pay the Fibonacci cost once; per-key expectations only splice the key.
    let fib = payload.expected(0)[0];
    // `validate()` rejects a zero cadence, but `run` is also reachable with a
    // hand-built config; checking every iteration beats dividing by zero.
    let check_freq = config.check_freq.max(1);

    let barrier = Barrier::new(config.threads);
    let cancel = AtomicBool::new(false);
    let total_iterations = AtomicU64::new(0);
    let total_hits = AtomicU64::new(0);

    let started = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.threads);
        for worker_id in 0..config.threads {
            let mut generator = prototype.clone_box();
            let barrier = &barrier;
            let cancel = &cancel;
            let total_iterations = &total_iterations;
            let total_hits = &total_hits;
            handles.push(scope.spawn(move || {
                generator.set_thread(worker_id, config.threads);
                barrier.wait();
                // Only the coordinator holds a start time; its Some-ness
                // doubles as the role check below.
                let started = (worker_id == 0).then(Instant::now);

                let mut iterations = 0u64;
                let mut hits = 0u64;
                let mut cancelled = false;
                while iterations < config.iterations && !cancelled {
                    let batch = generator.next_batch();
                    for key in batch.keys() {
                        let mut producer = || payload.produce(key);
                        let (hit, value) = backend.consume_cached_or_compute(key, &mut producer);
                        if hit {
                            hits += 1;
                        }
                        if value != [fib, key] {
                            tracing::warn!(
                                worker_id,
                                key,
                                got = ?value,
                                expected = ?[fib, key],
                                "cached value does not match produced value"
                            );
                        }
                    }
                    iterations += 1;
                    if iterations % check_freq == 0 {
                        if let Some(t0) = started {
                            if t0.elapsed() > config.time_limit {
                                cancel.store(true, Ordering::Relaxed);
                                cancelled = true;
                            }
                        } else if cancel.load(Ordering::Relaxed) {
                            cancelled = true;
                        }
                    }
                }
                total_iterations.fetch_add(iterations, Ordering::Relaxed);
                total_hits.fetch_add(hits, Ordering::Relaxed);
                started
            }));
        }

        let mut started = None;
        for handle in handles {
            if let Some(t0) = handle.join().expect("benchmark worker panicked") {
                started = Some(t0);
            }
        }
        started
    });

    RunResult {
        iterations: total_iterations.into_inner(),
        hits: total_hits.into_inner(),
        duration: started.map(|t0| t0.elapsed()).unwrap_or_default(),
        threads: config.threads,
    }
}
