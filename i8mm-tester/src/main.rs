//! i8mm-tester CLI
//!
//! Runs a kernel on the problem a fixture describes and writes the
//! line-oriented report. With `--test` the output is verified.
//!
//! Exit status: 0 on a completed run (including a failing verdict), 1 on
//! invalid usage, otherwise [`I8mmError::exit_code`].

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use i8mm::kernel::{BlockedKernel, NaiveKernel};
use i8mm::tester::{executor_for, run_fixture};
use i8mm::verify::DEFAULT_TRIALS;
use i8mm::{Backend, I8mmError, TesterConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "i8mm-tester")]
#[command(
    author,
    version,
    about = "Run and verify an int8 x int8 -> int32 matrix multiplication kernel"
)]
#[command(long_about = "
Reads a fixture (optional `timeout` line, an input mode, then `m n k` and,
for `tiled`, a tile size), generates A and B, runs the kernel and writes
`key<TAB>value` report lines.

Input modes: id_x_b, a_x_id, uniform, ternary, tiled
")]
struct Cli {
    /// Verify the kernel output (otherwise only run and time it)
    #[arg(long)]
    test: bool,

    /// Fixture file
    #[arg(value_name = "FIXTURE")]
    fixture: PathBuf,

    /// Where the report goes (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Execution backend
    #[arg(short, long, value_enum, default_value_t = BackendArg::Host)]
    backend: BackendArg,

    /// Host kernel to run [default: blocked]; the GPU backend runs its own shader
    #[arg(short, long, value_enum)]
    kernel: Option<KernelArg>,

    /// Seed for output garbage and Freivalds vectors (falls back to I8MM_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Freivalds trials for untiled problems
    #[arg(long, default_value_t = DEFAULT_TRIALS, value_parser = parse_trials)]
    trials: usize,

    /// Log verbosity on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Host,
    Gpu,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Host => Backend::Host,
            BackendArg::Gpu => Backend::Gpu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KernelArg {
    /// Scalar triple loop
    Naive,
    /// Cache-blocked, row-parallel
    Blocked,
}

fn parse_trials(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(v) => Ok(v),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<I8mmError>().map_or(1, I8mmError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TesterConfig::default()
        .with_test(cli.test)
        .with_seed(cli.seed)
        .with_env_seed()
        .with_freivalds_trials(cli.trials)
        .with_backend(cli.backend.into());

    if let (Backend::Gpu, Some(kernel)) = (config.backend, cli.kernel) {
        tracing::warn!(?kernel, "--kernel is ignored with --backend gpu");
    }

    let mut executor = match cli.kernel.unwrap_or(KernelArg::Blocked) {
        KernelArg::Naive => executor_for(config.backend, NaiveKernel)?,
        KernelArg::Blocked => executor_for(config.backend, BlockedKernel::default())?,
    };

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .map_err(I8mmError::Report)
                .with_context(|| format!("creating report file {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let summary = run_fixture(&cli.fixture, executor.as_mut(), &config, sink)
        .with_context(|| format!("running fixture {}", cli.fixture.display()))?;

    match &summary.outcome {
        Some(outcome) if !outcome.passed() => {
            tracing::info!(size = %outcome.size_class(), "kernel output rejected")
        }
        Some(_) => tracing::info!(elapsed = ?summary.elapsed, "kernel output verified"),
        None => tracing::info!(elapsed = ?summary.elapsed, "kernel run complete"),
    }
    Ok(())
}
