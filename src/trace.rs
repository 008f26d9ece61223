//! Binary trace decoding and the process-wide trace registry.
//!
//! ## Wire Format
//!
//! A trace file is a sequence of 64-bit little-endian words. Four header
//! words come first:
//!
//! ```text
//! [ version | record_count | total_request_count | distinct_key_count ]
//! ```
//!
//! - Version 1 body: `record_count` raw keys, each expanding to
//!   `KeySequence { key, 1 }`.
//! - Version 2 body: `record_count` `(key, count)` pairs, expanding to
//!   `KeySequence { key, count }`. The counts must sum to
//!   `total_request_count` or the decode fails.
//!
//! Any other version, or a body shorter than the header declares, is a hard
//! decode failure and nothing is cached. Version 1 carries no cross-check of
//! `record_count` against `total_request_count`; that asymmetry is part of
//! the format as observed and is deliberately not "fixed" here.
//!
//! ## Registry
//!
//! [`TraceRegistry`] decodes each path at most once per process and hands out
//! shared, immutable [`Trace`]s after that. It is an explicit object owned by
//! the top-level driver, not a hidden global: created at startup, append-only,
//! dropped at process exit. Cached traces are never re-validated against the
//! underlying file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::TraceError;
use crate::generator::KeySequence;

/// Header length in 64-bit words.
const HEADER_WORDS: usize = 4;

/// A decoded trace: an ordered, run-length-encoded request list.
///
/// Immutable after construction and shared read-only by every generator clone
/// replaying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// Requests in recorded order.
    pub requests: Vec<KeySequence>,
    /// Number of distinct keys the trace touches, as declared by the header.
    pub distinct_count: u64,
}

impl Trace {
    /// Total number of key accesses the trace expands to. Saturates, like
    /// the decode-time count validation.
    pub fn request_count(&self) -> u64 {
        self.requests
            .iter()
            .fold(0u64, |acc, seq| acc.saturating_add(seq.count))
    }

    /// Decodes a trace from raw bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use cachebench::trace::Trace;
    ///
    /// // version 2, 2 records, 4 requests, 10 distinct keys; body (5,3) (9,1)
    /// let words: Vec<u64> = vec![2, 2, 4, 10, 5, 3, 9, 1];
    /// let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    ///
    /// let trace = Trace::decode(&bytes).unwrap();
    /// assert_eq!(trace.requests.len(), 2);
    /// assert_eq!(trace.distinct_count, 10);
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Trace, TraceError> {
        let header = read_words(bytes, 0, HEADER_WORDS)?;
        let [version, record_count, total_request_count, distinct_count] =
            [header[0], header[1], header[2], header[3]];

        let words_per_record = match version {
            1 => 1,
            2 => 2,
            other => return Err(TraceError::UnsupportedVersion(other)),
        };

        // A record count the input length cannot possibly back is the same
        // failure as a short body; checked math keeps hostile headers from
        // wrapping the word count.
        let body_words = (record_count as usize)
            .checked_mul(words_per_record)
            .ok_or(TraceError::ShortRead {
                expected: usize::MAX,
                actual: bytes.len(),
            })?;
        let body = read_words(bytes, HEADER_WORDS, body_words)?;

        let requests = match version {
            1 => body.iter().map(|&key| KeySequence::new(key, 1)).collect(),
            _ => {
                let mut requests = Vec::with_capacity(record_count as usize);
                let mut total = 0u64;
                for pair in body.chunks_exact(2) {
                    requests.push(KeySequence::new(pair[0], pair[1]));
                    total = total.saturating_add(pair[1]);
                }
                if total != total_request_count {
                    return Err(TraceError::RequestCountMismatch {
                        declared: total_request_count,
                        actual: total,
                    });
                }
                requests
            },
        };

        Ok(Trace {
            requests,
            distinct_count,
        })
    }
}

/// Reads `count` little-endian u64 words starting at word offset `skip`.
fn read_words(bytes: &[u8], skip: usize, count: usize) -> Result<Vec<u64>, TraceError> {
    let start = skip * 8;
    let end = count
        .checked_mul(8)
        .and_then(|len| start.checked_add(len))
        .ok_or(TraceError::ShortRead {
            expected: usize::MAX,
            actual: bytes.len(),
        })?;
    let slice = bytes.get(start..end).ok_or(TraceError::ShortRead {
        expected: end,
        actual: bytes.len(),
    })?;
    Ok(slice
        .chunks_exact(8)
        .map(|chunk| u64::from_le_bytes(chunk.try_into().expect("8-byte chunk")))
        .collect())
}

/// Process-wide cache of decoded traces, keyed by path.
///
/// Decoding happens at most once per path; later lookups return the same
/// shared [`Trace`]. Failed decodes are not cached and propagate to the
/// caller.
#[derive(Debug, Default)]
pub struct TraceRegistry {
    cache: Mutex<FxHashMap<PathBuf, Arc<Trace>>>,
}

impl TraceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the decoded trace for `path`, decoding it on first use.
    ///
    /// The registry lock is held across the decode so two racing loads of the
    /// same path still decode exactly once.
    pub fn load(&self, path: &Path) -> Result<Arc<Trace>, TraceError> {
        let mut cache = self.cache.lock();
        if let Some(trace) = cache.get(path) {
            return Ok(Arc::clone(trace));
        }

        let bytes = fs::read(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trace = Arc::new(Trace::decode(&bytes)?);
        cache.insert(path.to_path_buf(), Arc::clone(&trace));
        Ok(trace)
    }

    /// Number of traces decoded so far.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn encode(words: &[u64]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn v2_decodes_run_length_pairs() {
        let bytes = encode(&[2, 2, 4, 10, 5, 3, 9, 1]);
        let trace = Trace::decode(&bytes).unwrap();

        assert_eq!(
            trace.requests,
            vec![KeySequence::new(5, 3), KeySequence::new(9, 1)]
        );
        assert_eq!(trace.distinct_count, 10);
        assert_eq!(trace.request_count(), 4);
    }

    #[test]
    fn v2_rejects_request_count_mismatch() {
        // Header declares 5 requests, body sums to 4.
        let bytes = encode(&[2, 2, 5, 10, 5, 3, 9, 1]);
        match Trace::decode(&bytes) {
            Err(TraceError::RequestCountMismatch { declared, actual }) => {
                assert_eq!(declared, 5);
                assert_eq!(actual, 4);
            },
            other => panic!("expected count mismatch, got {other:?}"),
        }
    }

    #[test]
    fn v1_expands_raw_keys_without_cross_check() {
        // Header's total_request_count (3) is not validated for v1; a header
        // declaring something else would still decode.
        let bytes = encode(&[1, 3, 3, 5, 7, 7, 8]);
        let trace = Trace::decode(&bytes).unwrap();

        assert_eq!(
            trace.requests,
            vec![
                KeySequence::new(7, 1),
                KeySequence::new(7, 1),
                KeySequence::new(8, 1),
            ]
        );
        assert_eq!(trace.distinct_count, 5);

        let lying_header = encode(&[1, 3, 999, 5, 7, 7, 8]);
        assert!(Trace::decode(&lying_header).is_ok());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let bytes = encode(&[3, 0, 0, 0]);
        assert!(matches!(
            Trace::decode(&bytes),
            Err(TraceError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn short_body_is_rejected() {
        // Header promises 4 records but only 2 keys follow.
        let bytes = encode(&[1, 4, 4, 4, 1, 2]);
        assert!(matches!(
            Trace::decode(&bytes),
            Err(TraceError::ShortRead { .. })
        ));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let bytes = encode(&[2, 2]);
        assert!(matches!(
            Trace::decode(&bytes),
            Err(TraceError::ShortRead { .. })
        ));
    }

    #[test]
    fn registry_decodes_each_path_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&encode(&[2, 1, 3, 2, 4, 3])).unwrap();

        let registry = TraceRegistry::new();
        let first = registry.load(file.path()).unwrap();
        let second = registry.load(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(first.requests, vec![KeySequence::new(4, 3)]);
    }

    #[test]
    fn registry_does_not_cache_failures() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&encode(&[9, 0, 0, 0])).unwrap();

        let registry = TraceRegistry::new();
        assert!(registry.load(file.path()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_propagates_io_errors() {
        let registry = TraceRegistry::new();
        let err = registry.load(Path::new("does/not/exist.bin")).unwrap_err();
        assert!(matches!(err, TraceError::Io { .. }));
    }
}
