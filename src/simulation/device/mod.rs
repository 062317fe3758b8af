//! # Data-Offload Execution
//!
//! The data-offload strategy expresses a frame as a grid of independent
//! work-items, one per boid, dispatched to a [`ComputeDevice`]. Every
//! work-item reads the frame snapshot through a read-only view and writes
//! only its own slot of a separate output buffer. A dispatch returns after
//! a full barrier, so the output is complete when the host reads it.
//!
//! Two devices are provided:
//!
//! - [`HostDevice`]: the kernel grid run by a dedicated rayon pool
//! - [`GpuDevice`]: a wgpu compute shader evaluating the kernel in f64

pub mod gpu;
pub mod host;

pub use gpu::GpuDevice;
pub use host::HostDevice;

use super::boid::Boid;
use super::executor::FrameExecutor;
use super::kernel::FlockKernel;
use crate::error::Result;

/// Work-items per workgroup on every device
pub const WORKGROUP_SIZE: usize = 64;

/// Number of workgroups needed to cover `items` work-items
pub fn workgroup_count(items: usize) -> usize {
    items.div_ceil(WORKGROUP_SIZE)
}

/// A device that evaluates the kernel grid
pub trait ComputeDevice {
    fn name(&self) -> &str;

    /// Runs one work-item per snapshot entry, writing `output[i]` for
    /// `snapshot[i]`, and blocks until every work-item has finished.
    ///
    /// `output` has the same length as `snapshot`.
    fn dispatch(&mut self, snapshot: &[Boid], output: &mut [Boid], kernel: &FlockKernel) -> Result<()>;
}

/// Frame executor that hands each frame to a [`ComputeDevice`]
pub struct OffloadExecutor {
    device: Box<dyn ComputeDevice>,
    name: String,
}

impl OffloadExecutor {
    pub fn new(device: Box<dyn ComputeDevice>) -> Self {
        let name = format!("data-offload ({})", device.name());
        Self { device, name }
    }

    pub fn device(&self) -> &dyn ComputeDevice {
        self.device.as_ref()
    }
}

impl FrameExecutor for OffloadExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_frame(&mut self, snapshot: &[Boid], kernel: &FlockKernel) -> Result<Vec<Boid>> {
        // Write view, same size as the read view
        let mut output = snapshot.to_vec();
        if !snapshot.is_empty() {
            self.device.dispatch(snapshot, &mut output, kernel)?;
        }
        Ok(output)
    }
}
