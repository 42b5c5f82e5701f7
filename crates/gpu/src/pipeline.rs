use std::borrow::Cow;

use flows::{LineVertex, ParticleInstance};

use crate::error::GpuError;
use crate::shaders;

pub const LINE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 8,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 16,
            shader_location: 2,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 24,
            shader_location: 3,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 28,
            shader_location: 4,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 32,
            shader_location: 5,
        },
    ],
};

/// One instance per particle; the six quad corners come from `vertex_index`.
pub const PARTICLE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &[
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 8,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 16,
            shader_location: 2,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 20,
            shader_location: 3,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 24,
            shader_location: 4,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 28,
            shader_location: 5,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 32,
            shader_location: 6,
        },
    ],
};

pub const QUAD_VERTICES: u32 = 6;

/// Both draw pipelines. A pipeline whose shader failed to compile or whose
/// program failed to link stays `None` for the rest of the session and its
/// draws are skipped.
#[derive(Debug)]
pub struct FlowPipelines {
    pub lines: Option<wgpu::RenderPipeline>,
    pub particles: Option<wgpu::RenderPipeline>,
}

impl FlowPipelines {
    pub async fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        globals_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flows-pipeline-layout"),
            bind_group_layouts: &[globals_layout],
            immediate_size: 0,
        });

        let lines = build(
            device,
            &layout,
            format,
            "flows-lines",
            shaders::lines_source(),
            LINE_LAYOUT,
            wgpu::PrimitiveTopology::LineList,
        )
        .await;
        let particles = build(
            device,
            &layout,
            format,
            "flows-particles",
            shaders::particles_source(),
            PARTICLE_LAYOUT,
            wgpu::PrimitiveTopology::TriangleList,
        )
        .await;

        Self {
            lines: disable_on_error(lines),
            particles: disable_on_error(particles),
        }
    }
}

fn disable_on_error<T>(result: Result<T, GpuError>) -> Option<T> {
    match result {
        Ok(pipeline) => Some(pipeline),
        Err(err) => {
            tracing::error!(%err, "pipeline disabled");
            None
        }
    }
}

/// Joined text of the error-level compiler messages, if any.
fn compile_errors(messages: &[wgpu::CompilationMessage]) -> Option<String> {
    let errors: Vec<&str> = messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| m.message.as_str())
        .collect();
    (!errors.is_empty()).then(|| errors.join("; "))
}

/// Maps whatever the validation scope caught while creating `label`.
fn scope_result(label: &'static str, captured: Option<wgpu::Error>) -> Result<(), GpuError> {
    match captured {
        None => Ok(()),
        Some(err) => Err(GpuError::Pipeline {
            label,
            message: err.to_string(),
        }),
    }
}

async fn build(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    label: &'static str,
    source: String,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    topology: wgpu::PrimitiveTopology,
) -> Result<wgpu::RenderPipeline, GpuError> {
    // Validation and link failures land in this scope instead of the
    // device's uncaptured-error handler, which panics.
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                // ONE, ONE_MINUS_SRC_ALPHA over premultiplied shader output.
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    // Popping takes effect immediately; nothing else is recorded in the scope.
    let captured = scope.pop();

    let info = module.get_compilation_info().await;
    if let Some(message) = compile_errors(&info.messages) {
        return Err(GpuError::Shader { label, message });
    }
    scope_result(label, captured.await)?;
    Ok(pipeline)
}
