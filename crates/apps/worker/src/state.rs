use engine::Engine;
use foundation::time::Time;
use gpu::FlowRenderer;
use protocol::{Command, WorkerMessage};
use web_sys::OffscreenCanvas;

/// The transferred render target. Only its backing-store size is touched
/// outside GPU initialisation.
pub trait Canvas: Clone {
    fn set_size(&self, width: u32, height: u32);
}

impl Canvas for OffscreenCanvas {
    fn set_size(&self, width: u32, height: u32) {
        self.set_width(width);
        self.set_height(height);
    }
}

/// Follow-up work a command needs from the JS side.
#[derive(Debug, Default, PartialEq)]
pub struct Effects {
    pub outbound: Vec<WorkerMessage>,
    /// A render target is available and no GPU context exists for it yet.
    pub init_gpu: bool,
    pub schedule_frame: bool,
}

/// Canvas and backing size handed to GPU initialisation. `generation`
/// changes with every new canvas and every shutdown, so a context that
/// finishes building after either is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget<C> {
    pub canvas: C,
    pub width: u32,
    pub height: u32,
    pub generation: u64,
}

/// Everything the worker owns. Accessed only from the worker thread, one
/// message or frame at a time.
pub struct WorkerState<C = OffscreenCanvas> {
    engine: Engine,
    renderer: Option<FlowRenderer>,
    canvas: Option<C>,
    generation: u64,
    gpu_requested: bool,
    frame_pending: bool,
}

impl<C: Canvas> WorkerState<C> {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            renderer: None,
            canvas: None,
            generation: 0,
            gpu_requested: false,
            frame_pending: false,
        }
    }

    pub fn handle(&mut self, command: Command, canvas: Option<C>) -> Effects {
        let is_init = matches!(command, Command::Init { .. });
        let replaced = match canvas {
            Some(canvas) if is_init => {
                self.replace_canvas(canvas);
                true
            }
            Some(_) => {
                tracing::warn!(kind = command.kind(), "canvas ignored outside init");
                false
            }
            None => false,
        };

        let outcome = self.engine.handle(command);
        if replaced || outcome.resized {
            self.apply_size();
        }
        if outcome.geometry_changed {
            if let Some(renderer) = &mut self.renderer {
                renderer.upload(self.engine.geometry());
            }
        }
        if outcome.stopped {
            self.teardown();
        }

        let init_gpu = (outcome.started || replaced)
            && self.engine.is_running()
            && self.canvas.is_some()
            && self.renderer.is_none()
            && !self.gpu_requested;
        self.gpu_requested |= init_gpu;

        let schedule_frame = self.engine.is_running() && !self.frame_pending;
        self.frame_pending |= schedule_frame;

        Effects {
            outbound: outcome.outbound,
            init_gpu,
            schedule_frame,
        }
    }

    /// A new target invalidates any context built or being built for the old one.
    fn replace_canvas(&mut self, canvas: C) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        self.canvas = Some(canvas);
        self.generation += 1;
        self.gpu_requested = false;
        tracing::debug!(generation = self.generation, "render target replaced");
    }

    /// Draws one frame. Returns whether another should be requested.
    pub fn frame(&mut self, now: Time) -> bool {
        self.frame_pending = false;
        if !self.engine.is_running() {
            return false;
        }
        let params = self.engine.frame(now);
        if let Some(renderer) = &mut self.renderer {
            if let Err(err) = renderer.render(&params) {
                tracing::warn!(%err, "frame skipped");
            }
        }
        self.frame_pending = true;
        true
    }

    pub fn frame_dropped(&mut self) {
        self.frame_pending = false;
    }

    pub fn render_target(&self) -> Option<RenderTarget<C>> {
        let (width, height) = self.engine.view().backing_size();
        self.canvas.clone().map(|canvas| RenderTarget {
            canvas,
            width,
            height,
            generation: self.generation,
        })
    }

    pub fn accepts(&self, generation: u64) -> bool {
        self.engine.is_running() && self.renderer.is_none() && generation == self.generation
    }

    /// Installs a freshly built renderer, or destroys it when its canvas or
    /// session has been replaced in the meantime.
    pub fn attach_renderer(&mut self, mut renderer: FlowRenderer, generation: u64) {
        if !self.accepts(generation) {
            tracing::debug!(generation, current = self.generation, "discarding stale renderer");
            renderer.destroy();
            return;
        }
        self.gpu_requested = false;
        renderer.upload(self.engine.geometry());
        tracing::debug!(
            line_vertices = renderer.line_vertex_count(),
            particles = renderer.particle_count(),
            "renderer attached"
        );
        self.renderer = Some(renderer);
        self.apply_size();
    }

    fn apply_size(&mut self) {
        let (width, height) = self.engine.view().backing_size();
        if let Some(canvas) = &self.canvas {
            canvas.set_size(width, height);
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(width, height);
        }
    }

    fn teardown(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        self.generation += 1;
        self.gpu_requested = false;
    }
}
