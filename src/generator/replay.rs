//! Deterministic trace replay, strided across worker threads.
//!
//! Worker `i` of `T` visits trace positions `i, i+T, i+2T, ...`. When a
//! cursor runs off the end it resets to `i`, the worker's own offset rather
//! than zero, keeping each thread phase-locked to its stride and avoiding
//! every thread piling onto position 0 at wrap time.

use std::path::PathBuf;
use std::sync::Arc;

use super::{KeyGenerator, KeySequence};
use crate::error::ConfigError;
use crate::trace::Trace;

/// Replays a decoded [`Trace`], partitioned by stride across threads.
///
/// The trace itself is shared read-only between clones; the cursor and
/// thread assignment are private per clone.
#[derive(Debug, Clone)]
pub struct TraceReplayGenerator {
    path: PathBuf,
    trace: Arc<Trace>,
    thread_id: usize,
    thread_count: usize,
    cursor: usize,
}

impl TraceReplayGenerator {
    /// Builds a replay prototype for `thread_count` workers.
    ///
    /// Fails fast if the trace is empty or shorter than the worker count: a
    /// worker whose offset lies past the last record would have no position
    /// to replay, so the mismatch is a configuration error, not a run-time
    /// condition.
    pub fn new(
        path: PathBuf,
        trace: Arc<Trace>,
        thread_count: usize,
    ) -> Result<Self, ConfigError> {
        if trace.requests.is_empty() {
            return Err(ConfigError::new(format!(
                "trace {} contains no requests",
                path.display()
            )));
        }
        if thread_count > trace.requests.len() {
            return Err(ConfigError::new(format!(
                "trace {} has {} records, fewer than {thread_count} threads",
                path.display(),
                trace.requests.len()
            )));
        }
        Ok(Self {
            path,
            trace,
            thread_id: 0,
            thread_count: 1,
            cursor: 0,
        })
    }
}

impl KeyGenerator for TraceReplayGenerator {
    fn name(&self) -> String {
        format!("trace:{}", self.path.display())
    }

    fn clone_box(&self) -> Box<dyn KeyGenerator> {
        Box::new(self.clone())
    }

    fn set_thread(&mut self, id: usize, count: usize) {
        debug_assert!(
            id < self.trace.requests.len(),
            "worker offset past the last trace record; construction checks this"
        );
        self.thread_id = id;
        self.thread_count = count.max(1);
        self.cursor = id;
    }

    fn next_batch(&mut self) -> KeySequence {
        if self.cursor >= self.trace.requests.len() {
            self.cursor = self.thread_id;
        }
        let batch = self.trace.requests[self.cursor];
        self.cursor += self.thread_count;
        batch
    }

    fn unique_key_estimate(&self) -> u64 {
        self.trace.distinct_count
    }
}
