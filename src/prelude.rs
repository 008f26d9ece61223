pub use crate::backend::{
    build_backend, BucketedBackend, CacheBackend, MemStats, ProfileStats, Value,
};
pub use crate::config::RunConfig;
pub use crate::driver::{run, RunResult};
pub use crate::error::{BenchError, ConfigError, TraceError};
pub use crate::generator::{GeneratorSpec, KeyGenerator, KeySequence};
pub use crate::report::{CsvLogger, RunRecord};
pub use crate::trace::{Trace, TraceRegistry};
