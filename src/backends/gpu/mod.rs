//! GPU execution using wgpu (Vulkan/Metal/DX12/WebGPU)
//!
//! The kernel runs on device memory, so every call pays an explicit
//! host → device upload before dispatch and a device synchronization plus
//! device → host readback after it. Only dispatch and synchronization are
//! timed.
//!
//! # Architecture
//!
//! - Device initialization is lazy (first execution)
//! - Pipeline is compiled once per device
//! - Asynchronous wgpu calls are driven to completion with pollster

mod device;
mod shaders;

use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::instrument;

pub use device::{DeviceBuffers, GpuDevice};

use super::Executor;
use crate::{Backend, I8mmError, Problem, Result};

/// Runs the built-in WGSL gemm kernel on a GPU
#[derive(Default)]
pub struct GpuExecutor {
    device: Option<GpuDevice>,
}

impl GpuExecutor {
    /// Create an executor; the device is opened on first use
    pub fn new() -> Self {
        Self { device: None }
    }

    /// Check if GPU is available
    pub fn is_available() -> bool {
        GpuDevice::is_available()
    }

    fn ensure_device(&mut self) -> Result<&GpuDevice> {
        if self.device.is_none() {
            self.device = Some(GpuDevice::new().map_err(I8mmError::GpuError)?);
        }
        self.device
            .as_ref()
            .ok_or_else(|| I8mmError::GpuError("device not initialized".to_string()))
    }
}

impl Executor for GpuExecutor {
    fn backend(&self) -> Backend {
        Backend::Gpu
    }

    fn kernel_name(&self) -> &str {
        "wgsl"
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip_all,
            fields(m = problem.m(), n = problem.n(), k = problem.k())
        )
    )]
    fn execute(&mut self, problem: &Problem, output: &mut [i32]) -> Result<Duration> {
        problem.check_output(output)?;
        let device = self.ensure_device()?;

        let buffers = device
            .upload(
                problem.a(),
                problem.b(),
                output,
                problem.m(),
                problem.n(),
                problem.k(),
            )
            .map_err(I8mmError::GpuError)?;

        let start = Instant::now();
        device.dispatch(&buffers);
        device.synchronize();
        let elapsed = start.elapsed();

        device
            .download(&buffers, output)
            .map_err(I8mmError::GpuError)?;
        Ok(elapsed)
    }
}
