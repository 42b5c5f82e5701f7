use foundation::math::{TILE_SIZE, Vec2, wrap_end_x};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::sampling::WeightedSampler;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficKind {
    General,
    Hidden,
}

impl TrafficKind {
    /// Tag stored in vertex data and compared against the traffic filter uniform.
    pub fn tag(self) -> f32 {
        match self {
            TrafficKind::General => 0.0,
            TrafficKind::Hidden => 1.0,
        }
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Route {
    pub from: u32,
    pub to: u32,
    pub start: Vec2,
    /// Seam-corrected: `end.x` may lie one tile width outside `[0, tile_size)`.
    pub end: Vec2,
    pub kind: TrafficKind,
    /// Product of the endpoint bandwidths.
    pub score: f64,
    /// 0 for the highest-scoring route, 1 for the lowest.
    pub rank: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub max_routes: usize,
    /// Attempts allowed per route slot before generation gives up.
    pub retry_multiplier: usize,
    /// Added to bandwidth before the square root so zero-bandwidth nodes stay selectable.
    pub weight_epsilon: f64,
    pub tile_size: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_routes: 3000,
            retry_multiplier: 10,
            weight_epsilon: 1e-6,
            tile_size: TILE_SIZE,
        }
    }
}

/// Draws a ranked route set from `nodes`.
///
/// With probability `hidden_probability` a draw picks both endpoints uniformly
/// from hidden-service-directory nodes (when at least two exist); otherwise
/// both endpoints come from the bandwidth-weighted distribution. Self-loops are
/// rejected. The result is sorted by descending score with ranks assigned.
pub fn generate_routes<R: Rng + ?Sized>(
    nodes: &[Node],
    hidden_probability: f64,
    config: &RouteConfig,
    rng: &mut R,
) -> Vec<Route> {
    if nodes.len() < 2 || config.max_routes == 0 {
        tracing::debug!(nodes = nodes.len(), "too few nodes for routes");
        return Vec::new();
    }

    let Some(sampler) = WeightedSampler::new(
        nodes
            .iter()
            .map(|n| (n.bandwidth + config.weight_epsilon).sqrt()),
    ) else {
        return Vec::new();
    };

    let hidden: Vec<u32> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.hidden_service_dir)
        .map(|(i, _)| i as u32)
        .collect();
    let hidden_probability = hidden_probability.clamp(0.0, 1.0);

    let budget = config.max_routes.saturating_mul(config.retry_multiplier);
    let mut routes = Vec::with_capacity(config.max_routes);
    let mut attempts = 0usize;

    while routes.len() < config.max_routes && attempts < budget {
        attempts += 1;

        let use_hidden = hidden.len() >= 2 && rng.random::<f64>() < hidden_probability;
        let (from, to, kind) = if use_hidden {
            let a = hidden[rng.random_range(0..hidden.len())];
            let b = hidden[rng.random_range(0..hidden.len())];
            (a, b, TrafficKind::Hidden)
        } else {
            let a = sampler.sample(rng) as u32;
            let b = sampler.sample(rng) as u32;
            (a, b, TrafficKind::General)
        };
        if from == to {
            continue;
        }

        let a = &nodes[from as usize];
        let b = &nodes[to as usize];
        let end = Vec2::new(
            wrap_end_x(a.position.x, b.position.x, config.tile_size),
            b.position.y,
        );
        routes.push(Route {
            from,
            to,
            start: a.position,
            end,
            kind,
            score: a.bandwidth * b.bandwidth,
            rank: 0.0,
        });
    }

    if routes.len() < config.max_routes {
        tracing::debug!(
            generated = routes.len(),
            attempts,
            "route generation stopped on retry budget"
        );
    }

    rank_routes(&mut routes);
    routes
}

/// Sorts by descending score and assigns `rank = i / max(n - 1, 1)`.
pub fn rank_routes(routes: &mut [Route]) {
    routes.sort_by(|a, b| b.score.total_cmp(&a.score));
    let denom = routes.len().saturating_sub(1).max(1) as f64;
    for (i, r) in routes.iter_mut().enumerate() {
        r.rank = i as f64 / denom;
    }
}
