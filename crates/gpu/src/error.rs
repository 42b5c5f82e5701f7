use std::fmt;

#[derive(Debug)]
pub enum GpuError {
    Surface(String),
    Adapter(String),
    Device(String),
    Shader { label: &'static str, message: String },
    /// Pipeline creation failed validation or the program failed to link.
    Pipeline { label: &'static str, message: String },
    /// Acquiring the next swapchain texture failed.
    Frame(wgpu::SurfaceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::Surface(e) => write!(f, "surface error: {e}"),
            GpuError::Adapter(e) => write!(f, "adapter error: {e}"),
            GpuError::Device(e) => write!(f, "device error: {e}"),
            GpuError::Shader { label, message } => {
                write!(f, "shader {label} failed to compile: {message}")
            }
            GpuError::Pipeline { label, message } => {
                write!(f, "pipeline {label} failed to build: {message}")
            }
            GpuError::Frame(e) => write!(f, "surface acquire failed: {e}"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::SurfaceError> for GpuError {
    fn from(value: wgpu::SurfaceError) -> Self {
        GpuError::Frame(value)
    }
}
