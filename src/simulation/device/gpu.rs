//! # GPU Compute Device
//!
//! Evaluates the flocking kernel as a wgpu compute shader. Each frame:
//!
//! 1. the snapshot is uploaded into a read-only storage buffer
//! 2. one invocation per boid writes its slot of a separate read-write buffer
//! 3. the output is copied into a staging buffer, mapped, and read back
//!
//! Mapping the staging buffer waits on the device, which is the barrier
//! between dispatch and the host consuming the results.
//!
//! The shader runs in f64 so results agree with the host executors to within
//! rounding. Adapters without [`wgpu::Features::SHADER_F64`] are rejected.

use super::{workgroup_count, ComputeDevice, WORKGROUP_SIZE};
use crate::error::{FlockError, Result};
use crate::simulation::boid::{Boid, Color};
use crate::simulation::kernel::FlockKernel;
use crate::wgpu_utils::{binding_types, compute_entry, ArrayBuffer, UniformBuffer};
use cgmath::Vector2;

const SHADER_SOURCE: &str = include_str!("boids.wgsl");

/// Boid layout shared with the shader
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuBoid {
    pub id: u32,
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl From<&Boid> for GpuBoid {
    fn from(boid: &Boid) -> Self {
        Self {
            id: boid.id(),
            r: boid.color.r as u32,
            g: boid.color.g as u32,
            b: boid.color.b as u32,
            x: boid.position.x,
            y: boid.position.y,
            vx: boid.velocity.x,
            vy: boid.velocity.y,
        }
    }
}

impl From<GpuBoid> for Boid {
    fn from(raw: GpuBoid) -> Self {
        Boid::new(
            raw.id,
            Vector2::new(raw.x, raw.y),
            Vector2::new(raw.vx, raw.vy),
            Color::new(raw.r.min(255) as u8, raw.g.min(255) as u8, raw.b.min(255) as u8),
        )
    }
}

/// Kernel parameters as laid out in the shader's `Params` struct
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuParams {
    pub max_range: f64,
    pub visible_range_sq: f64,
    pub close_range_sq: f64,
    pub centering_factor: f64,
    pub matching_factor: f64,
    pub avoid_factor: f64,
    pub turn_factor: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub edge_low: f64,
    pub edge_high_x: f64,
    pub edge_high_y: f64,
    pub count: u32,
    pub _padding: [u32; 3],
}

impl GpuParams {
    pub fn new(kernel: &FlockKernel, count: u32) -> Self {
        let rules = &kernel.rules;
        Self {
            max_range: rules.max_range,
            visible_range_sq: rules.visible_range_squared(),
            close_range_sq: rules.close_range_squared(),
            centering_factor: rules.centering_factor,
            matching_factor: rules.matching_factor,
            avoid_factor: rules.avoid_factor,
            turn_factor: rules.turn_factor,
            min_speed: rules.min_speed,
            max_speed: rules.max_speed,
            edge_low: kernel.edges.low,
            edge_high_x: kernel.edges.high_x,
            edge_high_y: kernel.edges.high_y,
            count,
            _padding: [0; 3],
        }
    }
}

/// Buffers sized for one flock, recreated when the flock outgrows them
struct FrameBuffers {
    snapshot: ArrayBuffer<GpuBoid>,
    output: ArrayBuffer<GpuBoid>,
    staging: ArrayBuffer<GpuBoid>,
    bind_group: wgpu::BindGroup,
}

impl FrameBuffers {
    /// Returns buffers holding at least `count` boids, reallocating if needed
    fn ensure<'a>(
        slot: &'a mut Option<FrameBuffers>,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params: &UniformBuffer<GpuParams>,
        count: usize,
    ) -> &'a FrameBuffers {
        if slot
            .as_ref()
            .is_some_and(|buffers| buffers.snapshot.capacity() < count)
        {
            *slot = None;
        }
        slot.get_or_insert_with(|| Self::new(device, layout, params, count))
    }

    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params: &UniformBuffer<GpuParams>,
        count: usize,
    ) -> Self {
        log::debug!("Allocating GPU buffers for {count} boids");
        let snapshot = ArrayBuffer::new(device, count, true);
        let output = ArrayBuffer::new(device, count, false);
        let staging = ArrayBuffer::new_staging(device, count);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Flock Kernel Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: snapshot.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.binding_resource(),
                },
            ],
        });
        Self {
            snapshot,
            output,
            staging,
            bind_group,
        }
    }
}

/// Compute device backed by a wgpu adapter
pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    params: UniformBuffer<GpuParams>,
    buffers: Option<FrameBuffers>,
    max_items: usize,
}

impl GpuDevice {
    /// Requests a high-performance adapter with f64 shader support (blocking)
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| FlockError::NoAdapter(e.to_string()))?;

        if !adapter.features().contains(wgpu::Features::SHADER_F64) {
            return Err(FlockError::MissingFeature("SHADER_F64"));
        }

        let adapter_name = adapter.get_info().name;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Flock Compute Device"),
                required_features: wgpu::Features::SHADER_F64,
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Flock Kernel Layout"),
            entries: &[
                compute_entry(0, binding_types::storage_buffer_read_only()),
                compute_entry(1, binding_types::storage_buffer_read_write()),
                compute_entry(2, binding_types::storage_buffer_read_only()),
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flock Kernel Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flock Kernel Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Flock Kernel Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params = UniformBuffer::new_storage(&device);

        let limits = device.limits();
        let by_dispatch = limits.max_compute_workgroups_per_dimension as usize * WORKGROUP_SIZE;
        let by_binding =
            limits.max_storage_buffer_binding_size as usize / std::mem::size_of::<GpuBoid>();
        let max_items = by_dispatch.min(by_binding);

        log::info!("GPU compute device ready on {adapter_name} (up to {max_items} boids)");

        Ok(Self {
            device,
            queue,
            adapter_name,
            pipeline,
            layout,
            params,
            buffers: None,
            max_items,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

impl ComputeDevice for GpuDevice {
    fn name(&self) -> &str {
        "gpu"
    }

    fn dispatch(&mut self, snapshot: &[Boid], output: &mut [Boid], kernel: &FlockKernel) -> Result<()> {
        let count = snapshot.len();
        if count > self.max_items {
            return Err(FlockError::DispatchTooLarge {
                count,
                limit: self.max_items,
            });
        }

        let raw: Vec<GpuBoid> = snapshot.iter().map(GpuBoid::from).collect();
        self.params
            .update_content(&self.queue, GpuParams::new(kernel, count as u32));

        let buffers = FrameBuffers::ensure(
            &mut self.buffers,
            &self.device,
            &self.layout,
            &self.params,
            count,
        );
        buffers.snapshot.update_data(&self.queue, &raw);

        let workgroups = workgroup_count(count) as u32;
        log::trace!("GPU dispatch: {count} work-items in {workgroups} workgroups");

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Flock Kernel Encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flock Kernel Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &buffers.bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroups, 1, 1);
        }
        buffers.output.copy_to(&mut encoder, &buffers.staging, count);
        self.queue.submit(std::iter::once(encoder.finish()));

        let results = buffers.staging.read_back(&self.device, count)?;
        for (slot, result) in output.iter_mut().zip(results) {
            *slot = Boid::from(result);
        }
        Ok(())
    }
}
