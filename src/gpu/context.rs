//! GPU context management.

use super::error::GpuError;
use std::sync::Arc;

/// GPU context holding device, queue, and adapter information.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Create a new GPU context.
    ///
    /// This is async because wgpu adapter and device requests are async.
    /// Use `pollster::block_on` to call from sync code.
    pub async fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("devil-breaker-gpu"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    /// Create a new GPU context synchronously.
    pub fn new_sync() -> Result<Self, GpuError> {
        pollster::block_on(Self::new())
    }

    /// Largest number of invocations a single 1-D dispatch can cover.
    pub fn max_invocations_per_dispatch(&self, workgroup_size: u32) -> u32 {
        let limits = self.device.limits();
        limits
            .max_compute_workgroups_per_dimension
            .saturating_mul(workgroup_size)
    }

    /// Get a human-readable description of the GPU.
    pub fn description(&self) -> String {
        format!(
            "{} ({:?})",
            self.adapter_info.name, self.adapter_info.backend
        )
    }

    /// Run `f` inside an error scope and turn any captured device error into `wrap(msg)`.
    pub(crate) fn scoped<T>(
        &self,
        filter: wgpu::ErrorFilter,
        wrap: fn(String) -> GpuError,
        f: impl FnOnce() -> T,
    ) -> Result<T, GpuError> {
        self.device.push_error_scope(filter);
        let value = f();
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(wrap(err.to_string())),
            None => Ok(value),
        }
    }
}
