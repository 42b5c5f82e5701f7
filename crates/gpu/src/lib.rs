//! wgpu resource owner for the flow overlay: context, pipelines, buffers and
//! the per-frame draw.

pub mod buffers;
pub mod constants;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod shaders;
pub mod uniforms;

pub use constants::RenderConstants;
pub use context::GpuContext;
pub use error::GpuError;
pub use renderer::FlowRenderer;
