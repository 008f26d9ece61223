//! Run reporting: an append-only CSV sink plus a structured log summary.
//!
//! Every completed run appends one row to a shared CSV file, so a sweep of
//! runs accumulates into a single table ready for plotting. The header is
//! written only when the file is empty, which makes it safe to point many
//! invocations at the same path.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::backend::MemStats;
use crate::driver::RunResult;

/// One finished run, flattened for the report.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_name: String,
    pub run_tag: String,
    pub generator: String,
    pub backend: String,
    /// Distinct keys the generator can emit, 0 when unbounded.
    pub unique_key_estimate: u64,
    pub mem: MemStats,
    pub result: RunResult,
    pub payload_level: u32,
    pub pull_threshold: f64,
    pub purge_threshold: f64,
}

const HEADER: &str = "test_name,test_tag,generator,unique_keys,container,capacity,\
                      total_mem,payload,threads,iterations,hits,hit_rate,duration_secs,\
                      throughput,thread_throughput,pull_threshold,purge_threshold";

/// Appends [`RunRecord`] rows to a CSV file.
pub struct CsvLogger {
    path: PathBuf,
    file: File,
}

impl CsvLogger {
    /// Opens `path` for appending, creating it if needed. The column header
    /// is written only when the file is empty.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{HEADER}")?;
        }
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and emits the run summary through `tracing`.
    pub fn log(&mut self, record: &RunRecord) -> io::Result<()> {
        let result = &record.result;
        writeln!(
            self.file,
            "{},{},{},{},{},{},{},{},{},{},{},{:.6},{:.6},{:.3},{:.3},{},{}",
            record.run_name,
            record.run_tag,
            record.generator,
            record.unique_key_estimate,
            record.backend,
            record.mem.capacity,
            record.mem.total_mem,
            record.payload_level,
            result.threads,
            result.iterations,
            result.hits,
            result.hit_rate(),
            result.duration.as_secs_f64(),
            result.throughput(),
            result.thread_throughput(),
            record.pull_threshold,
            record.purge_threshold,
        )?;
        self.file.flush()?;

        tracing::info!(
            run = %record.run_name,
            backend = %record.backend,
            generator = %record.generator,
            threads = result.threads,
            iterations = result.iterations,
            hits = result.hits,
            hit_rate = result.hit_rate(),
            duration_secs = result.duration.as_secs_f64(),
            throughput = result.throughput(),
            "run complete"
        );
        Ok(())
    }
}
