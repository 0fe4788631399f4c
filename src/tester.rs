//! End-to-end test driver
//!
//! One run: generate the problem, pre-fill the output with garbage, execute
//! the kernel, then write the report. In `test` mode the output is verified
//! and the verdict reported; otherwise the report ends in `result\tdone`.
//!
//! # Example
//!
//! ```
//! use i8mm::kernel::NaiveKernel;
//! use i8mm::tester::{executor_for, run};
//! use i8mm::{fixture::Fixture, Backend, TesterConfig};
//!
//! let fixture: Fixture = "uniform 2 2 2".parse().unwrap();
//! let config = TesterConfig::default().with_test(true).with_seed(Some(3));
//! let mut exec = executor_for(Backend::Host, NaiveKernel).unwrap();
//! let mut report = Vec::new();
//! let summary = run(&fixture.build(), exec.as_mut(), &config, &mut report).unwrap();
//! assert!(summary.passed());
//! assert!(String::from_utf8(report).unwrap().contains("result\tpass"));
//! ```

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::backends::host::HostExecutor;
use crate::backends::Executor;
use crate::fixture::Fixture;
use crate::report::ReportWriter;
use crate::verify::{verify, Outcome};
use crate::{Backend, Kernel, Problem, RandomSource, Result, TesterConfig};

/// What one run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Kernel wall time
    pub elapsed: Duration,
    /// Verdict, present in `test` mode only
    pub outcome: Option<Outcome>,
}

impl RunSummary {
    /// False only when verification ran and rejected the output
    pub fn passed(&self) -> bool {
        self.outcome.as_ref().map_or(true, Outcome::passed)
    }
}

/// Builds the executor for `backend`
///
/// `kernel` is used by the host backend; the GPU backend runs its built-in
/// shader.
///
/// # Errors
///
/// Returns `UnsupportedBackend` when `backend` is not compiled in, and
/// `GpuError` when it is compiled in but no device can run it.
pub fn executor_for<K>(backend: Backend, kernel: K) -> Result<Box<dyn Executor>>
where
    K: Kernel + 'static,
{
    if !backend.is_compiled() {
        return Err(crate::I8mmError::UnsupportedBackend(backend));
    }
    if !backend.is_available() {
        return Err(crate::I8mmError::GpuError(format!("no {backend} device available")));
    }
    match backend {
        Backend::Host => Ok(Box::new(HostExecutor::new(kernel))),
        #[cfg(feature = "gpu")]
        Backend::Gpu => Ok(Box::new(crate::backends::gpu::GpuExecutor::new())),
        #[cfg(not(feature = "gpu"))]
        Backend::Gpu => Err(crate::I8mmError::UnsupportedBackend(backend)),
    }
}

/// Output buffer filled with values in `[0, i32::MAX]`
pub fn garbage_output(len: usize, rng: &mut RandomSource) -> Vec<i32> {
    (0..len).map(|_| rng.get_i32(0, i32::MAX)).collect()
}

/// Runs and reports one problem
///
/// The same [`RandomSource`] seeds the output garbage and the Freivalds
/// vectors, so a fixed `config.seed` reproduces the whole run.
///
/// # Errors
///
/// Propagates executor failures, and `Report` errors from the sink.
pub fn run<W: Write>(
    problem: &Problem,
    executor: &mut dyn Executor,
    config: &TesterConfig,
    sink: W,
) -> Result<RunSummary> {
    let mut rng = config.random_source();
    let mut output = garbage_output(problem.output_len(), &mut rng);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        m = problem.m(),
        n = problem.n(),
        k = problem.k(),
        tile_size = ?problem.tile_size(),
        backend = %executor.backend(),
        kernel = executor.kernel_name(),
        seed = rng.seed(),
        "running kernel"
    );

    let elapsed = executor.execute(problem, &mut output)?;

    let mut report = ReportWriter::new(sink);
    report.time(elapsed)?;
    report.shape(problem)?;

    let outcome = if config.test {
        let outcome = verify(problem, &output, config.freivalds_trials, &mut rng);
        report.outcome(problem, &output, &outcome)?;
        Some(outcome)
    } else {
        report.done()?;
        None
    };
    report.finish()?;

    Ok(RunSummary { elapsed, outcome })
}

/// Parses a fixture file, then [`run`]s it
///
/// # Errors
///
/// Fixture errors as in [`Fixture::from_path`], then those of [`run`].
pub fn run_fixture<W: Write>(
    path: impl AsRef<Path>,
    executor: &mut dyn Executor,
    config: &TesterConfig,
    sink: W,
) -> Result<RunSummary> {
    let fixture = Fixture::from_path(path)?;
    run(&fixture.build(), executor, config, sink)
}
