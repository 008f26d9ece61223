//! Command-line entry point: parse flags, assemble a run, execute it, and
//! append the outcome to the shared CSV report.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cachebench::config::RunConfig;
use cachebench::driver;
use cachebench::error::BenchError;
use cachebench::report::{CsvLogger, RunRecord};
use cachebench::trace::TraceRegistry;

#[derive(Debug, Parser)]
#[command(name = "cachebench", version, about)]
struct Cli {
    /// CSV file results are appended to.
    #[arg(short = 'L', long = "log-file", default_value = "results.csv")]
    log_file: PathBuf,

    /// Run name recorded in the report.
    #[arg(short = 'N', long = "name", default_value = "run")]
    name: String,

    /// Free-form tag recorded alongside the run name.
    #[arg(short = 'T', long = "tag", default_value = "")]
    tag: String,

    /// Backend under test: dummy, hash, b_dummy, b_hash.
    #[arg(short = 'B', long = "backend", default_value = "hash")]
    backend: String,

    /// Workload: uniform, normal, exp, same, varsame, disjoint, or a trace
    /// path (traces/... or trace:<path>).
    #[arg(short = 'G', long = "generator", default_value = "uniform")]
    generator: String,

    /// Cache capacity in entries. Exactly one of --capacity/--memory.
    #[arg(short = 'c', long = "capacity", conflicts_with = "memory")]
    capacity: Option<u64>,

    /// Cache capacity in bytes. Exactly one of --capacity/--memory.
    #[arg(short = 'm', long = "memory")]
    memory: Option<u64>,

    /// Worker thread count.
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    threads: usize,

    /// Per-worker iteration budget.
    #[arg(short = 'i', long = "iterations", default_value_t = 1_000_000)]
    iterations: u64,

    /// Iterations between clock / cancel-flag checks.
    #[arg(short = 'q', long = "print-freq", default_value_t = 1000)]
    check_freq: u64,

    /// Wall-clock budget in seconds.
    #[arg(long = "time-limit", default_value_t = 60)]
    time_limit: u64,

    /// Miss-cost depth of the Fibonacci payload.
    #[arg(short = 'p', long = "payload", default_value_t = 5)]
    payload: u32,

    /// Report-only tuning knobs, carried into the CSV row.
    #[arg(long = "pull-thrs", default_value_t = 0.1)]
    pull_threshold: f64,
    #[arg(long = "purge-thrs", default_value_t = 0.1)]
    purge_threshold: f64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<(RunConfig, PathBuf), BenchError> {
        let (capacity, is_item_capacity) = match (self.capacity, self.memory) {
            (Some(entries), None) => (entries, true),
            (None, Some(bytes)) => (bytes, false),
            _ => {
                return Err(cachebench::error::ConfigError::new(
                    "exactly one of --capacity or --memory is required",
                )
                .into())
            },
        };
        let config = RunConfig {
            run_name: self.name,
            run_tag: self.tag,
            backend: self.backend,
            generator: self.generator,
            capacity,
            is_item_capacity,
            threads: self.threads,
            iterations: self.iterations,
            check_freq: self.check_freq,
            time_limit: Duration::from_secs(self.time_limit),
            payload_level: self.payload,
            pull_threshold: self.pull_threshold,
            purge_threshold: self.purge_threshold,
        };
        Ok((config, self.log_file))
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cachebench={default}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn execute(cli: Cli) -> Result<(), BenchError> {
    let (config, log_path) = cli.into_config()?;

    let registry = TraceRegistry::new();
    let (mut backend, generator) = config.build_parts(&registry)?;

    tracing::info!(
        backend = %backend.name(),
        generator = %generator.name(),
        threads = config.threads,
        iterations = config.iterations,
        "starting run"
    );

    let result = driver::run(backend.as_ref(), generator.as_ref(), &config);
    let record = RunRecord {
        run_name: config.run_name.clone(),
        run_tag: config.run_tag.clone(),
        generator: generator.name(),
        backend: backend.name(),
        unique_key_estimate: generator.unique_key_estimate(),
        mem: backend.mem_stats(),
        result,
        payload_level: config.payload_level,
        pull_threshold: config.pull_threshold,
        purge_threshold: config.purge_threshold,
    };
    backend.release_memory();

    let mut logger = CsvLogger::open(&log_path)?;
    logger.log(&record)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        },
    }
}
