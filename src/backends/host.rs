//! Host execution: the kernel runs directly on CPU memory
//!
//! The kernel receives private copies of `A` and `B`, so a kernel that
//! scribbles over its inputs cannot change what the verifier checks against.

use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::Executor;
use crate::{Backend, Kernel, Problem, Result};

/// Runs a [`Kernel`] on host memory
#[derive(Debug, Clone)]
pub struct HostExecutor<K> {
    kernel: K,
}

impl<K: Kernel> HostExecutor<K> {
    /// Wraps a kernel
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }
}

impl<K: Kernel> Executor for HostExecutor<K> {
    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn kernel_name(&self) -> &str {
        self.kernel.name()
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(kernel = self.kernel.name()))
    )]
    fn execute(&mut self, problem: &Problem, output: &mut [i32]) -> Result<Duration> {
        problem.check_output(output)?;

        let a = problem.a().to_vec();
        let b = problem.b().to_vec();

        let start = Instant::now();
        self.kernel
            .gemm(problem.m(), problem.n(), problem.k(), &a, &b, output);
        Ok(start.elapsed())
    }
}
