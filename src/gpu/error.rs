//! GPU error types.

use std::fmt;

/// Errors that can occur during GPU operations.
#[derive(Debug)]
pub enum GpuError {
    /// No suitable GPU adapter found
    NoAdapter,
    /// Failed to request GPU device
    DeviceRequest(wgpu::RequestDeviceError),
    /// Shader compilation failed
    ShaderCompilation(String),
    /// Device buffer could not be allocated
    Allocation(String),
    /// Kernel dispatch was rejected by the device
    Launch(String),
    /// Copying results back to the host failed
    Transfer(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "No suitable GPU adapter found"),
            GpuError::DeviceRequest(e) => write!(f, "Failed to request GPU device: {}", e),
            GpuError::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            GpuError::Allocation(msg) => write!(f, "GPU buffer allocation failed: {}", msg),
            GpuError::Launch(msg) => write!(f, "Kernel launch failed: {}", msg),
            GpuError::Transfer(msg) => write!(f, "Device transfer failed: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceRequest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceRequest(err)
    }
}
