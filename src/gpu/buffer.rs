//! GPU buffer management.
//!
//! Buffers are plain owned `wgpu::Buffer` values: dropping them releases the
//! device memory, so every early return from a search frees what it allocated.

use super::context::GpuContext;
use super::error::GpuError;
use std::sync::Arc;

/// Buffer factory for GPU memory allocation.
pub struct GpuBufferFactory {
    device: Arc<wgpu::Device>,
}

impl GpuBufferFactory {
    /// Create a new buffer factory.
    pub fn new(ctx: &GpuContext) -> Self {
        Self {
            device: ctx.device.clone(),
        }
    }

    /// Create a read-only storage buffer for kernel input.
    pub fn create_storage_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a storage buffer the kernel writes and the host reads back.
    pub fn create_output_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a staging buffer for downloading data from GPU.
    pub fn create_staging_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a uniform buffer for small, frequently-updated data.
    pub fn create_uniform_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

/// Copy `size` bytes of `buffer` into `staging` and read them on the host.
pub fn read_buffer_sync(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    staging: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<u8>, GpuError> {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("read-encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, staging, 0, size);
    queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..size);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|e| GpuError::Transfer(e.to_string()))?
        .map_err(|e| GpuError::Transfer(e.to_string()))?;

    let data = slice.get_mapped_range().to_vec();
    staging.unmap();

    Ok(data)
}
