//! Engine state and the command handler that owns the rebuild pipeline.
//!
//! All state lives in one [`Engine`] owned by the render thread. Commands run
//! to completion; the render loop only reads the results.

use flows::{
    Aggregation, Centroid, FlowGeometry, GeometryConfig, RawNode, Route, RouteConfig, aggregate,
    build_geometry, density_prefix, generate_routes, visible_nodes,
};
use foundation::time::Time;
use protocol::{Command, SettingsPatch, WorkerMessage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use runtime::FrameClock;
use runtime::metrics::{self, Metrics};
use serde::{Deserialize, Serialize};

use crate::frame::{FrameParams, frame_params};
use crate::settings::{RebuildLevel, Settings, classify};
use crate::view::ViewState;

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub routes: RouteConfig,
    pub geometry: GeometryConfig,
}

/// What a command did, for the thread that owns the GPU.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outcome {
    pub rebuild: RebuildLevel,
    /// Vertex data was rebuilt and must be re-uploaded.
    pub geometry_changed: bool,
    /// Viewport or pixel ratio changed; the surface must be reconfigured.
    pub resized: bool,
    pub started: bool,
    pub stopped: bool,
    pub outbound: Vec<WorkerMessage>,
}

pub struct Engine<R = ChaCha8Rng> {
    config: EngineConfig,
    settings: Settings,
    view: ViewState,
    raw_nodes: Vec<RawNode>,
    centroids: Option<Vec<Centroid>>,
    aggregation: Aggregation,
    /// Full ranked candidate set, descending score.
    routes: Vec<Route>,
    /// Length of the displayed prefix of `routes`.
    visible_len: usize,
    geometry: FlowGeometry,
    clock: FrameClock,
    metrics: Metrics,
    running: bool,
    rng: R,
}

impl Engine<ChaCha8Rng> {
    pub fn seeded(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Engine<R> {
    pub fn with_rng(config: EngineConfig, rng: R) -> Self {
        Self {
            config,
            settings: Settings::default(),
            view: ViewState::default(),
            raw_nodes: Vec::new(),
            centroids: None,
            aggregation: Aggregation::default(),
            routes: Vec::new(),
            visible_len: 0,
            geometry: FlowGeometry::default(),
            clock: FrameClock::new(),
            metrics: Metrics::new(),
            running: false,
            rng,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn visible_routes(&self) -> &[Route] {
        &self.routes[..self.visible_len.min(self.routes.len())]
    }

    pub fn geometry(&self) -> &FlowGeometry {
        &self.geometry
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle(&mut self, command: Command) -> Outcome {
        tracing::debug!(kind = command.kind(), "handling command");
        match command {
            Command::Init {
                device_pixel_ratio,
                centroids,
            } => self.init(device_pixel_ratio, centroids),
            Command::UpdateNodes { nodes } => match nodes {
                Some(nodes) => self.set_nodes(nodes),
                None => Outcome::default(),
            },
            Command::UpdateViewState { view_state } => Outcome {
                resized: view_state.is_some_and(|patch| self.view.apply(&patch)),
                ..Outcome::default()
            },
            Command::Resize {
                width,
                height,
                device_pixel_ratio,
            } => Outcome {
                resized: self.view.resize(width, height, device_pixel_ratio),
                ..Outcome::default()
            },
            Command::UpdateSettings { settings } => match settings {
                Some(patch) => self.update_settings(&patch),
                None => Outcome::default(),
            },
            Command::Shutdown => {
                self.running = false;
                Outcome {
                    stopped: true,
                    ..Outcome::default()
                }
            }
        }
    }

    fn init(&mut self, device_pixel_ratio: Option<f64>, centroids: Option<Vec<Centroid>>) -> Outcome {
        let resized = self.view.resize(None, None, device_pixel_ratio);
        let mut out = match centroids {
            Some(centroids) => {
                self.centroids = Some(centroids);
                // Country nodes may have been built without centroids.
                if self.settings.path_mode == flows::PathMode::Country && !self.raw_nodes.is_empty() {
                    self.rebuild(RebuildLevel::Regenerate)
                } else {
                    Outcome::default()
                }
            }
            None => Outcome::default(),
        };
        out.started = !self.running;
        out.resized |= resized;
        self.running = true;
        out
    }

    pub fn set_nodes(&mut self, nodes: Vec<RawNode>) -> Outcome {
        self.raw_nodes = nodes;
        self.rebuild(RebuildLevel::Regenerate)
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Outcome {
        if patch.is_empty() {
            tracing::debug!("empty settings patch");
            return Outcome::default();
        }
        let level = classify(&self.settings, patch);
        self.settings.apply(patch);
        tracing::debug!(?level, "settings updated");
        self.rebuild(level)
    }

    /// Runs every stage at or below `level`, most invasive first.
    pub fn rebuild(&mut self, level: RebuildLevel) -> Outcome {
        let mut out = Outcome {
            rebuild: level,
            ..Outcome::default()
        };
        if level == RebuildLevel::None {
            return out;
        }

        if level >= RebuildLevel::Regenerate {
            self.regenerate();
        }
        if level >= RebuildLevel::Refilter {
            self.refilter();
            out.outbound.push(WorkerMessage::VisibleNodes {
                indices: visible_nodes(self.visible_routes(), &self.aggregation),
            });
        }
        self.rebuild_geometry();
        out.geometry_changed = true;
        tracing::debug!(?level, metrics = ?self.metrics.snapshot(), "rebuild complete");
        out
    }

    fn regenerate(&mut self) {
        self.aggregation = aggregate(
            &self.raw_nodes,
            self.settings.path_mode,
            self.centroids.as_deref(),
            self.config.routes.tile_size,
        );
        self.metrics.inc_counter(metrics::NODES_AGGREGATED, 1);

        self.routes = generate_routes(
            &self.aggregation.nodes,
            self.settings.hidden_service_probability,
            &self.config.routes,
            &mut self.rng,
        );
        self.metrics.inc_counter(metrics::ROUTES_REGENERATED, 1);
        self.metrics
            .set_gauge(metrics::ROUTES_TOTAL, self.routes.len() as i64);

        if self.routes.is_empty() {
            tracing::warn!(nodes = self.aggregation.nodes.len(), "no routes generated");
        } else {
            tracing::info!(
                nodes = self.aggregation.nodes.len(),
                routes = self.routes.len(),
                "regenerated routes"
            );
        }
    }

    fn refilter(&mut self) {
        self.visible_len = density_prefix(&self.routes, self.settings.density).len();
        self.metrics.inc_counter(metrics::ROUTES_REFILTERED, 1);
        self.metrics
            .set_gauge(metrics::ROUTES_VISIBLE, self.visible_len as i64);
    }

    fn rebuild_geometry(&mut self) {
        let visible = &self.routes[..self.visible_len.min(self.routes.len())];
        self.geometry = build_geometry(
            visible,
            self.settings.particle_options(),
            &self.config.geometry,
            &mut self.rng,
        );
        self.metrics.inc_counter(metrics::GEOMETRY_REBUILT, 1);
        self.metrics
            .set_gauge(metrics::LINE_VERTICES, self.geometry.lines.len() as i64);
        self.metrics
            .set_gauge(metrics::PARTICLES, self.geometry.particles.len() as i64);
    }

    /// Advances the frame clock and derives this frame's draw parameters.
    pub fn frame(&mut self, now: Time) -> FrameParams {
        let frame = self.clock.tick(now);
        if frame.index == 0 {
            tracing::debug!("first frame");
        }
        tracing::trace!(index = frame.index, dt_s = frame.dt_s, "frame");
        frame_params(
            &self.view,
            &self.settings,
            frame.elapsed_s,
            self.config.routes.tile_size,
        )
    }
}
