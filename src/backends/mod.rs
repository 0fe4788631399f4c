//! Execution strategies for the kernel under test
//!
//! The verification core only ever sees host-resident data. How the kernel
//! gets its operands, and when its result is considered finished, is the
//! business of an [`Executor`]:
//!
//! - `host`: runs any [`Kernel`](crate::Kernel) directly on host memory
//! - `gpu`: uploads the operands to a wgpu device, dispatches a compute
//!   shader, synchronizes, and reads the result back (`gpu` feature)
//!
//! Only the kernel call (plus device synchronization) is timed; transfers are
//! not.

pub mod host;

#[cfg(feature = "gpu")]
pub mod gpu;

use std::time::Duration;

use crate::{Backend, Problem, Result};

/// Runs a kernel for a problem and reports its wall time
pub trait Executor {
    /// Backend this executor targets
    fn backend(&self) -> Backend;

    /// Name of the kernel being run, for logs
    fn kernel_name(&self) -> &str;

    /// Fills `output` with the kernel's result for `problem`
    ///
    /// `output` arrives holding garbage and must be fully overwritten by the
    /// kernel. Returns the time spent in the kernel.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `output` does not fit the problem, or a
    /// backend-specific error if the device fails.
    fn execute(&mut self, problem: &Problem, output: &mut [i32]) -> Result<Duration>;
}
