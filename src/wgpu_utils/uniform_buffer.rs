// src/wgpu_utils/uniform_buffer.rs
//! Typed wrappers for parameter and array buffers on the GPU

use crate::error::{FlockError, Result};
use std::marker::PhantomData;

fn short_type_name<T>() -> &'static str {
    let type_name = std::any::type_name::<T>();
    let pos = type_name.rfind(':').unwrap_or(0);
    if pos > 0 {
        &type_name[(pos + 1)..]
    } else {
        type_name
    }
}

/// Single-value buffer holding kernel parameters
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Create a read-only storage buffer for compute shaders
    pub fn new_storage(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("StorageBuffer: {}", short_type_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Update buffer content, skipping the write when nothing changed
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Fixed-capacity buffer of `Content` elements
pub struct ArrayBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    capacity: usize,
}

impl<Content: bytemuck::Pod> ArrayBuffer<Content> {
    fn byte_len(len: usize) -> u64 {
        (len * std::mem::size_of::<Content>()) as u64
    }

    /// Storage buffer for a compute shader; writable buffers can also be copied from
    pub fn new(device: &wgpu::Device, capacity: usize, read_only: bool) -> Self {
        let usage = if read_only {
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST
        } else {
            wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC
        };

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("ArrayBuffer<{}>", short_type_name::<Content>())),
            size: Self::byte_len(capacity),
            usage,
            mapped_at_creation: false,
        });

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            capacity,
        }
    }

    /// Mappable buffer that receives copies for CPU readback
    pub fn new_staging(device: &wgpu::Device, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("StagingBuffer<{}>", short_type_name::<Content>())),
            size: Self::byte_len(capacity),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            capacity,
        }
    }

    /// Upload `data` to the start of the buffer
    pub fn update_data(&self, queue: &wgpu::Queue, data: &[Content]) {
        debug_assert!(data.len() <= self.capacity, "data exceeds buffer capacity");
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
    }

    /// Record a copy of the first `len` elements into `destination`
    pub fn copy_to(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        destination: &ArrayBuffer<Content>,
        len: usize,
    ) {
        encoder.copy_buffer_to_buffer(
            &self.buffer,
            0,
            &destination.buffer,
            0,
            Self::byte_len(len),
        );
    }

    /// Map a staging buffer and read its first `len` elements (blocking)
    pub fn read_back(&self, device: &wgpu::Device, len: usize) -> Result<Vec<Content>> {
        let slice = self.buffer.slice(..Self::byte_len(len));

        let (sender, receiver) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| FlockError::BufferMapping(e.to_string()))?;

        match futures::executor::block_on(receiver) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(FlockError::BufferMapping(e.to_string())),
            Err(_) => {
                return Err(FlockError::BufferMapping(
                    "map callback was dropped".to_string(),
                ))
            }
        }

        let data = {
            let mapped = slice.get_mapped_range();
            bytemuck::pod_collect_to_vec::<u8, Content>(&mapped)
        };
        self.buffer.unmap();
        Ok(data)
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
