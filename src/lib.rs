//! i8mm: Verification Engine for Integer Matrix-Multiplication Kernels
//!
//! **i8mm** checks that a kernel computing `C = A × B` (int8 `A` m×k, int8 `B`
//! k×n, int32 `C` m×n, row-major) produces exactly the right answer, at any
//! size:
//!
//! 1. **Exact** - O(m·n·k) reference multiply with a per-cell error map, used
//!    when the problem is small
//! 2. **Freivalds** - batched randomized identity test, O((m·n + n·k + m·k)·r),
//!    false-pass probability at most `255^-r`
//! 3. **Tile consistency** - for block-constant inputs, collapses the output
//!    to one value per tile, checks that exactly, and certifies every tile is
//!    homogeneous
//!
//! # Design Principles
//!
//! - **Kernels are plain functions**: anything implementing [`Kernel`],
//!   including closures, can be tested
//! - **Verification never trusts the kernel**: output starts as garbage and
//!   inputs are private copies
//! - **Explicit randomness**: every random draw comes from an owned
//!   [`RandomSource`]; fix the seed to reproduce a run
//! - **Backends are execution strategies**: host or GPU, the verifier only
//!   sees host memory
//!
//! # Quick Start
//!
//! ```rust
//! use i8mm::generator::InputMode;
//! use i8mm::kernel::{Kernel, NaiveKernel};
//! use i8mm::verify::verify;
//! use i8mm::RandomSource;
//!
//! let problem = InputMode::Uniform.build(8, 8, 8, None);
//! let mut c = vec![0; problem.output_len()];
//! NaiveKernel.gemm(8, 8, 8, problem.a(), problem.b(), &mut c);
//!
//! let outcome = verify(&problem, &c, 20, &mut RandomSource::new(1));
//! assert!(outcome.passed());
//! ```

use std::fmt;

pub mod backends;
pub mod config;
pub mod error;
pub mod fixture;
pub mod generator;
pub mod kernel;
pub mod problem;
pub mod report;
pub mod rng;
pub mod tester;
pub mod verify;

pub use config::TesterConfig;
pub use error::{I8mmError, Result};
pub use kernel::Kernel;
pub use problem::{CellStatus, ErrorMap, Problem};
pub use rng::RandomSource;
pub use verify::Outcome;

/// Kernel execution target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Host memory, any [`Kernel`]
    Host,
    /// GPU compute (wgpu), built-in shader
    Gpu,
}

impl Backend {
    /// Whether this backend is compiled into the build
    pub fn is_compiled(self) -> bool {
        match self {
            Backend::Host => true,
            Backend::Gpu => cfg!(feature = "gpu"),
        }
    }

    /// Whether this backend can run here (compiled in, and a device exists)
    pub fn is_available(self) -> bool {
        match self {
            Backend::Host => true,
            #[cfg(feature = "gpu")]
            Backend::Gpu => backends::gpu::GpuExecutor::is_available(),
            #[cfg(not(feature = "gpu"))]
            Backend::Gpu => false,
        }
    }

    /// Lower-case name used on the command line and in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Host => "host",
            Backend::Gpu => "gpu",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
