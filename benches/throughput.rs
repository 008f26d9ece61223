//! Lookup-path benchmarks for the benchmark harness itself.
//!
//! Run with: `cargo bench --bench throughput`
//!
//! Measures per-access latency of the backend lookup path and the shard
//! routing function, plus whole-run throughput of the parallel driver at a
//! small fixed workload.

use std::hint::black_box;
use std::time::{Duration, Instant};

use cachebench::backend::bucketed::route_key;
use cachebench::backend::build_backend;
use cachebench::config::RunConfig;
use cachebench::driver;
use cachebench::generator::GeneratorSpec;
use cachebench::trace::TraceRegistry;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};

const CAPACITY: u64 = 16_384;
const OPS: u64 = 100_000;

// ============================================================================
// Backend Lookup Latency (ns/op)
// ============================================================================

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_ns");
    group.throughput(Throughput::Elements(OPS));

    for name in ["dummy", "hash", "b_hash"] {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let backend = build_backend(name, CAPACITY, true).unwrap();
                // Warm the cache so hash backends measure the hit path.
                for key in 0..CAPACITY {
                    backend.consume_cached_or_compute(key, &mut || [1, key]);
                }
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        let key = i % CAPACITY;
                        black_box(backend.consume_cached_or_compute(key, &mut || [1, key]));
                    }
                }
                start.elapsed()
            })
        });
    }
    group.finish();
}

// ============================================================================
// Shard Routing (ns/key)
// ============================================================================

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("splitmix64_low6", |b| {
        b.iter(|| {
            for key in 0..OPS {
                black_box(route_key(black_box(key), 6));
            }
        })
    });
    group.finish();
}

// ============================================================================
// Parallel Driver (whole runs)
// ============================================================================

fn bench_driver(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver_run");
    group.sample_size(10);

    for threads in [1usize, 4] {
        let config = RunConfig {
            capacity: CAPACITY,
            threads,
            iterations: 20_000,
            check_freq: 1_000,
            time_limit: Duration::from_secs(300),
            payload_level: 1,
            ..RunConfig::default()
        };
        group.throughput(Throughput::Elements(config.iterations * threads as u64));
        group.bench_function(format!("uniform_hash_{threads}t"), |b| {
            b.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let backend = build_backend("hash", CAPACITY, true).unwrap();
                    let prototype = GeneratorSpec::Uniform { max_key: CAPACITY - 1 }
                        .build(&TraceRegistry::new(), threads)
                        .unwrap();
                    let result = driver::run(backend.as_ref(), prototype.as_ref(), &config);
                    total += result.duration;
                }
                total
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lookup, bench_routing, bench_driver);
criterion_main!(benches);
