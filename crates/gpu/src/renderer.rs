use engine::FrameParams;
use flows::FlowGeometry;

use crate::buffers::VertexBuffer;
use crate::constants::RenderConstants;
use crate::context::GpuContext;
use crate::error::GpuError;
use crate::pipeline::{FlowPipelines, QUAD_VERTICES};
use crate::uniforms::Globals;

/// Owns every GPU object of the overlay. Created once per render target;
/// rebuilds only refill the vertex buffers.
#[derive(Debug)]
pub struct FlowRenderer {
    ctx: GpuContext,
    constants: RenderConstants,
    pipelines: FlowPipelines,
    globals: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    lines: VertexBuffer,
    particles: VertexBuffer,
    destroyed: bool,
}

impl FlowRenderer {
    pub async fn new(ctx: GpuContext, constants: RenderConstants) -> Self {
        let device = &ctx.device;

        let globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flows-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flows-globals-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flows-globals-bg"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            }],
        });

        let pipelines = FlowPipelines::new(device, ctx.config.format, &globals_layout).await;
        let lines = VertexBuffer::new(device, "flows-line-vertices");
        let particles = VertexBuffer::new(device, "flows-particle-instances");

        Self {
            ctx,
            constants,
            pipelines,
            globals,
            globals_bind_group,
            lines,
            particles,
            destroyed: false,
        }
    }

    /// Replaces both buffers' contents. Buffers of a disabled pipeline are
    /// left untouched.
    pub fn upload(&mut self, geometry: &FlowGeometry) {
        if self.destroyed {
            return;
        }
        let (device, queue) = (&self.ctx.device, &self.ctx.queue);
        if self.pipelines.lines.is_some() {
            self.lines.upload(device, queue, &geometry.lines);
        }
        if self.pipelines.particles.is_some() {
            self.particles.upload(device, queue, &geometry.particles);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.destroyed {
            self.ctx.resize(width, height);
        }
    }

    pub fn line_vertex_count(&self) -> u32 {
        self.lines.count()
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.count()
    }

    /// Clears the target and draws lines, then particles, one call each.
    pub fn render(&mut self, params: &FrameParams) -> Result<(), GpuError> {
        if self.destroyed {
            return Ok(());
        }

        let frame = match self.ctx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost, reconfiguring");
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let globals = Globals::new(params, &self.constants);
        self.ctx
            .queue
            .write_buffer(&self.globals, 0, bytemuck::bytes_of(&globals));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("flows-encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("flows-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.constants.clear()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            if let Some(pipeline) = &self.pipelines.lines {
                if self.lines.count() > 0 {
                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(0, &self.globals_bind_group, &[]);
                    rpass.set_vertex_buffer(0, self.lines.slice());
                    rpass.draw(0..self.lines.count(), 0..1);
                }
            }

            if let Some(pipeline) = &self.pipelines.particles {
                if self.particles.count() > 0 {
                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(0, &self.globals_bind_group, &[]);
                    rpass.set_vertex_buffer(0, self.particles.slice());
                    rpass.draw(0..QUAD_VERTICES, 0..self.particles.count());
                }
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Releases buffer memory. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.lines.destroy();
        self.particles.destroy();
        self.globals.destroy();
        self.pipelines.lines = None;
        self.pipelines.particles = None;
        self.destroyed = true;
        tracing::info!("gpu resources released");
    }
}
