//! GPU device initialization and explicit host/device transfers

use super::shaders;

/// Workgroup edge used by [`shaders::GEMM_I8_SHADER`]
const WORKGROUP: u32 = 16;

/// GPU device manager
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Device-resident operands and result for one problem
pub struct DeviceBuffers {
    a: wgpu::Buffer,
    b: wgpu::Buffer,
    c: wgpu::Buffer,
    dims: wgpu::Buffer,
    staging: wgpu::Buffer,
    m: usize,
    n: usize,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Dimensions {
    m: u32,
    k: u32,
    n: u32,
    _padding: u32,
}

impl GpuDevice {
    /// Initialize GPU device and compile the gemm pipeline
    pub fn new() -> Result<Self, String> {
        pollster::block_on(async { Self::new_async().await })
    }

    async fn new_async() -> Result<Self, String> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or("Failed to find GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("i8mm GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| format!("Failed to create device: {}", e))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gemm i8 Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GEMM_I8_SHADER.into()),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Gemm Bind Group Layout"),
            entries: &[
                storage(0, true),
                storage(1, true),
                storage(2, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gemm Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Gemm Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
        })
    }

    /// Check if GPU is available
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::default();
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Host → device copy of `A`, `B` and the (garbage) initial `C`
    ///
    /// wgpu rejects zero-sized buffers, so callers must not pass empty
    /// matrices.
    pub fn upload(
        &self,
        a: &[i8],
        b: &[i8],
        c: &[i32],
        m: usize,
        n: usize,
        k: usize,
    ) -> Result<DeviceBuffers, String> {
        if a.is_empty() || b.is_empty() || c.is_empty() {
            return Err("GPU backend requires non-empty matrices".to_string());
        }
        let to_u32 = |v: usize| u32::try_from(v).map_err(|_| format!("dimension {v} exceeds u32"));
        let dims = Dimensions {
            m: to_u32(m)?,
            k: to_u32(k)?,
            n: to_u32(n)?,
            _padding: 0,
        };

        let a_wide: Vec<i32> = a.iter().map(|&v| i32::from(v)).collect();
        let b_wide: Vec<i32> = b.iter().map(|&v| i32::from(v)).collect();

        let input = |label: &str, len: usize| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (len * std::mem::size_of::<i32>()) as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let a_buffer = input("Matrix A", a_wide.len());
        let b_buffer = input("Matrix B", b_wide.len());

        let c_size = std::mem::size_of_val(c) as u64;
        let c_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Matrix C"),
            size: c_size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let dims_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dimensions"),
            size: std::mem::size_of::<Dimensions>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size: c_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.queue
            .write_buffer(&a_buffer, 0, bytemuck::cast_slice(&a_wide));
        self.queue
            .write_buffer(&b_buffer, 0, bytemuck::cast_slice(&b_wide));
        self.queue
            .write_buffer(&c_buffer, 0, bytemuck::cast_slice(c));
        self.queue
            .write_buffer(&dims_buffer, 0, bytemuck::bytes_of(&dims));
        self.synchronize();

        Ok(DeviceBuffers {
            a: a_buffer,
            b: b_buffer,
            c: c_buffer,
            dims: dims_buffer,
            staging: staging_buffer,
            m,
            n,
        })
    }

    /// Enqueue the gemm shader over device-resident buffers
    pub fn dispatch(&self, buffers: &DeviceBuffers) {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Gemm Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.a.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.b.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.c.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.dims.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Gemm Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Gemm Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);

            let groups_x = (buffers.m as u32).div_ceil(WORKGROUP);
            let groups_y = (buffers.n as u32).div_ceil(WORKGROUP);
            compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        self.queue.submit(Some(encoder.finish()));
    }

    /// Block until all submitted work has finished
    pub fn synchronize(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }

    /// Device → host copy of `C`
    pub fn download(&self, buffers: &DeviceBuffers, result: &mut [i32]) -> Result<(), String> {
        pollster::block_on(async { self.download_async(buffers, result).await })
    }

    async fn download_async(
        &self,
        buffers: &DeviceBuffers,
        result: &mut [i32],
    ) -> Result<(), String> {
        let size = std::mem::size_of_val(result) as u64;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(&buffers.c, 0, &buffers.staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = buffers.staging.slice(..);
        let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });

        self.synchronize();

        receiver
            .receive()
            .await
            .ok_or("Failed to receive mapping result")?
            .map_err(|e| format!("Buffer mapping failed: {:?}", e))?;

        {
            let data = buffer_slice.get_mapped_range();
            result.copy_from_slice(bytemuck::cast_slice(&data));
        }

        buffers.staging.unmap();

        Ok(())
    }
}
