//! Error types for the cachebench library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when a run configuration is invalid before any
//!   worker starts (unknown backend/generator name, zero capacity, conflicting
//!   capacity flags). A bad configuration never produces a partial run.
//! - [`TraceError`]: Returned when a binary trace file fails to decode
//!   (unsupported version, short read, request-count mismatch) or cannot be
//!   read at all. A failed decode is never cached.
//!
//! ## Example Usage
//!
//! ```
//! use cachebench::error::ConfigError;
//!
//! let err = ConfigError::new("unknown backend: frobnicate");
//! assert!(err.to_string().contains("frobnicate"));
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when run configuration parameters are invalid.
///
/// Produced by [`RunConfig::validate`](crate::config::RunConfig::validate),
/// the backend/generator factories, and fallible generator constructors.
/// Carries a human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// TraceError
// ---------------------------------------------------------------------------

/// Error returned when a binary trace file cannot be decoded.
///
/// Decoding is all-or-nothing: any of these conditions aborts the decode and
/// nothing is inserted into the [`TraceRegistry`](crate::trace::TraceRegistry).
#[derive(Debug)]
pub enum TraceError {
    /// The header declared a version this decoder does not understand.
    UnsupportedVersion(u64),
    /// The file ended before the number of bytes the header declared.
    ShortRead { expected: usize, actual: usize },
    /// A version-2 body whose run-length counts do not sum to the header's
    /// declared total request count.
    RequestCountMismatch { declared: u64, actual: u64 },
    /// The trace file could not be opened or read.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::UnsupportedVersion(v) => write!(f, "unsupported trace version {v}"),
            TraceError::ShortRead { expected, actual } => {
                write!(f, "short trace read: expected {expected} bytes, got {actual}")
            },
            TraceError::RequestCountMismatch { declared, actual } => write!(
                f,
                "trace request count mismatch: header declares {declared}, body sums to {actual}"
            ),
            TraceError::Io { path, source } => {
                write!(f, "can't read trace {}: {source}", path.display())
            },
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BenchError
// ---------------------------------------------------------------------------

/// Top-level error for assembling and running one benchmark.
///
/// Everything here is a fail-fast condition: no worker thread has started by
/// the time any of these can occur, and nothing is retried.
#[derive(Debug)]
pub enum BenchError {
    /// Invalid configuration (unknown names, bad parameters).
    Config(ConfigError),
    /// Trace file failed to decode.
    Trace(TraceError),
    /// I/O failure at a boundary (e.g. unwritable report file).
    Io(io::Error),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Config(e) => write!(f, "configuration error: {e}"),
            BenchError::Trace(e) => write!(f, "trace error: {e}"),
            BenchError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Config(e) => Some(e),
            BenchError::Trace(e) => Some(e),
            BenchError::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BenchError {
    fn from(e: ConfigError) -> Self {
        BenchError::Config(e)
    }
}

impl From<TraceError> for BenchError {
    fn from(e: TraceError) -> Self {
        BenchError::Trace(e)
    }
}

impl From<io::Error> for BenchError {
    fn from(e: io::Error) -> Self {
        BenchError::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 0");
        assert_eq!(err.to_string(), "capacity must be > 0");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn trace_error_display_is_specific() {
        let err = TraceError::UnsupportedVersion(7);
        assert!(err.to_string().contains('7'));

        let err = TraceError::RequestCountMismatch {
            declared: 5,
            actual: 4,
        };
        let text = err.to_string();
        assert!(text.contains('5') && text.contains('4'));
    }

    #[test]
    fn trace_io_error_exposes_source() {
        let err = TraceError::Io {
            path: PathBuf::from("traces/missing.bin"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
        assert_error::<TraceError>();
    }
}
