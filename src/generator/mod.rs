//! Workload generator family.
//!
//! A generator produces the request stream one worker thread consumes. The
//! driver clones a prototype once per worker and finalizes each clone with
//! [`KeyGenerator::set_thread`]; after that the clones are fully independent:
//! no RNG or cursor state is ever shared, so concurrent use across threads
//! needs no locking.
//!
//! ## Variants
//!
//! | Variant       | Stream                                                     |
//! |---------------|------------------------------------------------------------|
//! | `uniform`     | key ~ Uniform[0, max_key), per-thread seed                 |
//! | `normal`      | key ~ \|Normal(max/2, 0.315·max/2)\| clamped to max_key    |
//! | `exp`         | key ~ Exponential(λ), λ from an area-under-interval target |
//! | `same`        | strictly increasing counter, a sequential scan             |
//! | `varsame`     | increasing counter + jitter in [0, 40]                     |
//! | `disjoint`    | private 2^30-sized block per thread, zero overlap          |
//! | `traces/...`  | deterministic replay of a recorded trace                   |
//!
//! Batches are [`KeySequence`]s, run-length-encoded key runs. The synthetic
//! variants emit single-key batches; trace replay emits whatever run lengths
//! the trace recorded.

pub mod random;
pub mod replay;
pub mod sequential;

pub use random::{ExponentialGenerator, NormalGenerator, UniformGenerator};
pub use replay::TraceReplayGenerator;
pub use sequential::{DisjointGenerator, SameGenerator, VarSameGenerator};

use std::path::PathBuf;

use crate::error::{BenchError, ConfigError};
use crate::trace::TraceRegistry;

/// A run-length-encoded request batch: keys `start_index ..
/// start_index + count` were (or are to be) accessed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySequence {
    pub start_index: u64,
    pub count: u64,
}

impl KeySequence {
    #[inline]
    pub fn new(start_index: u64, count: u64) -> Self {
        Self { start_index, count }
    }

    /// Iterates the individual keys this batch expands to.
    ///
    /// A run that would pass `u64::MAX` is truncated at the top of the key
    /// space; decoded traces can carry such runs and must not take the hot
    /// loop down with them.
    ///
    /// # Example
    ///
    /// ```
    /// use cachebench::generator::KeySequence;
    ///
    /// let seq = KeySequence::new(5, 3);
    /// let keys: Vec<u64> = seq.keys().collect();
    /// assert_eq!(keys, vec![5, 6, 7]);
    /// ```
    #[inline]
    pub fn keys(self) -> impl Iterator<Item = u64> {
        self.start_index..self.start_index.saturating_add(self.count)
    }
}

/// Per-thread request stream.
///
/// Contract: `set_thread` is called exactly once per clone, before the first
/// `next_batch`, and finalizes the clone's partition/seed. Clones returned by
/// `clone_box` are deep copies; advancing one never affects another.
pub trait KeyGenerator: Send {
    /// Generator name used in reports.
    fn name(&self) -> String;

    /// Deep, independently owned copy of this generator's current state.
    fn clone_box(&self) -> Box<dyn KeyGenerator>;

    /// Finalizes this clone for worker `id` of `count` total workers.
    fn set_thread(&mut self, id: usize, count: usize);

    /// Draws the next request batch.
    fn next_batch(&mut self) -> KeySequence;

    /// Estimated number of distinct keys the stream can produce, or 0 when
    /// unbounded or unknown.
    fn unique_key_estimate(&self) -> u64 {
        0
    }
}

/// Fraction of the exponential probability mass the `exp` generator places
/// inside `[0, capacity)`.
const EXP_AREA_UNDER_INTERVAL: f64 = 0.8;

/// Parsed description of a generator; builds prototype instances.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorSpec {
    Uniform { max_key: u64 },
    Normal { max_key: u64 },
    Exponential { interval: u64, area: f64 },
    Same,
    VarSame,
    Disjoint,
    TraceReplay { path: PathBuf },
}

impl GeneratorSpec {
    /// Parses a generator name from the CLI.
    ///
    /// `capacity` parameterizes `exp`; `max_key` parameterizes `uniform` and
    /// `normal`. Names beginning with `traces/` (or the explicit `trace:`
    /// prefix) select trace replay. Unknown names fail fast.
    pub fn parse(name: &str, capacity: u64, max_key: u64) -> Result<Self, ConfigError> {
        match name {
            "uniform" => Ok(GeneratorSpec::Uniform { max_key }),
            "normal" => Ok(GeneratorSpec::Normal { max_key }),
            "exp" => Ok(GeneratorSpec::Exponential {
                interval: capacity,
                area: EXP_AREA_UNDER_INTERVAL,
            }),
            "same" => Ok(GeneratorSpec::Same),
            "varsame" => Ok(GeneratorSpec::VarSame),
            "disjoint" => Ok(GeneratorSpec::Disjoint),
            other => {
                if let Some(path) = other.strip_prefix("trace:") {
                    Ok(GeneratorSpec::TraceReplay {
                        path: PathBuf::from(path),
                    })
                } else if other.starts_with("traces/") {
                    Ok(GeneratorSpec::TraceReplay {
                        path: PathBuf::from(other),
                    })
                } else {
                    Err(ConfigError::new(format!("unknown generator: {other}")))
                }
            },
        }
    }

    /// Builds the prototype generator the driver will clone across `threads`
    /// workers.
    ///
    /// Trace replay resolves its trace through `registry`, decoding the file
    /// on first use; decode failures propagate unchanged, and a trace with
    /// fewer records than workers is rejected here, before any worker starts.
    pub fn build(
        &self,
        registry: &TraceRegistry,
        threads: usize,
    ) -> Result<Box<dyn KeyGenerator>, BenchError> {
        match self {
            GeneratorSpec::Uniform { max_key } => {
                Ok(Box::new(UniformGenerator::new(*max_key)?))
            },
            GeneratorSpec::Normal { max_key } => Ok(Box::new(NormalGenerator::new(*max_key)?)),
            GeneratorSpec::Exponential { interval, area } => {
                Ok(Box::new(ExponentialGenerator::new(*interval, *area)?))
            },
            GeneratorSpec::Same => Ok(Box::new(SameGenerator::new())),
            GeneratorSpec::VarSame => Ok(Box::new(VarSameGenerator::new())),
            GeneratorSpec::Disjoint => Ok(Box::new(DisjointGenerator::new())),
            GeneratorSpec::TraceReplay { path } => {
                let trace = registry.load(path)?;
                Ok(Box::new(TraceReplayGenerator::new(
                    path.clone(),
                    trace,
                    threads,
                )?))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_sequence_expands_in_order() {
        let seq = KeySequence::new(10, 4);
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec![10, 11, 12, 13]);
        assert_eq!(KeySequence::new(5, 0).keys().count(), 0);
    }

    #[test]
    fn key_sequence_truncates_at_the_top_of_the_key_space() {
        // A decoded trace may declare a run that would pass u64::MAX; the
        // expansion stops at the boundary instead of wrapping.
        let seq = KeySequence::new(u64::MAX - 2, 10);
        assert_eq!(
            seq.keys().collect::<Vec<_>>(),
            vec![u64::MAX - 2, u64::MAX - 1]
        );
    }

    #[test]
    fn parse_recognizes_every_synthetic_variant() {
        let cases = [
            ("uniform", GeneratorSpec::Uniform { max_key: 99 }),
            ("normal", GeneratorSpec::Normal { max_key: 99 }),
            (
                "exp",
                GeneratorSpec::Exponential {
                    interval: 1000,
                    area: EXP_AREA_UNDER_INTERVAL,
                },
            ),
            ("same", GeneratorSpec::Same),
            ("varsame", GeneratorSpec::VarSame),
            ("disjoint", GeneratorSpec::Disjoint),
        ];
        for (name, expected) in cases {
            assert_eq!(GeneratorSpec::parse(name, 1000, 99).unwrap(), expected);
        }
    }

    #[test]
    fn parse_routes_trace_paths_to_replay() {
        let spec = GeneratorSpec::parse("traces/web.bin", 0, 0).unwrap();
        assert_eq!(
            spec,
            GeneratorSpec::TraceReplay {
                path: PathBuf::from("traces/web.bin"),
            }
        );

        let spec = GeneratorSpec::parse("trace:/data/web.bin", 0, 0).unwrap();
        assert_eq!(
            spec,
            GeneratorSpec::TraceReplay {
                path: PathBuf::from("/data/web.bin"),
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert!(GeneratorSpec::parse("zipfian", 1000, 99).is_err());
    }
}
