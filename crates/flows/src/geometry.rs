use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::routes::Route;
use crate::tiers::tier_for_rank;

/// One endpoint of one straight segment of one lane of a route.
///
/// The vertex stage interpolates between `start` and `end` at
/// `mix(segment.x, segment.y, side)` and bows the point sideways by
/// `lane * sin(pi * t)`, so every lane meets at both route endpoints.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub segment: [f32; 2],
    pub side: f32,
    pub lane: f32,
    pub traffic: f32,
}

/// Per-particle instance data; motion is derived entirely on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub start: [f32; 2],
    pub end: [f32; 2],
    /// Base speed in pixels per second.
    pub speed: f32,
    /// Initial progress along the route in `[0, 1)`.
    pub phase: f32,
    pub traffic: f32,
    pub rank: f32,
    /// Drift across the lane bloom: `[-1, 1]` scaled by `lane_envelope`.
    pub lane: f32,
}

/// Tuned visual constants for the builder.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub segments_per_line: u32,
    pub particle_base_speed: f32,
    /// Particles per route when bandwidth scaling is off.
    pub uniform_particle_count: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            segments_per_line: 8,
            particle_base_speed: 60.0,
            uniform_particle_count: 2,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParticleOptions {
    /// Multiplier applied to the per-route base count.
    pub count_factor: f64,
    /// When false every route gets the same base count regardless of rank.
    pub scale_by_bandwidth: bool,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            count_factor: 1.0,
            scale_by_bandwidth: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlowGeometry {
    pub lines: Vec<LineVertex>,
    pub particles: Vec<ParticleInstance>,
}

impl FlowGeometry {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.particles.is_empty()
    }
}

pub fn particle_count(rank: f64, options: ParticleOptions, config: &GeometryConfig) -> u32 {
    if options.count_factor.is_nan() || options.count_factor <= 0.0 {
        return 0;
    }
    let base = if options.scale_by_bandwidth {
        tier_for_rank(rank).particle_count
    } else {
        config.uniform_particle_count
    };
    ((base as f64 * options.count_factor).round() as u32).max(1)
}

/// Lane offsets centered on zero, e.g. `[-1, 0, 1]` for three lines and
/// `[-0.5, 0.5]` for two.
pub fn lane_offsets(line_count: u32) -> impl Iterator<Item = f32> {
    let center = (line_count.saturating_sub(1)) as f32 / 2.0;
    (0..line_count).map(move |i| i as f32 - center)
}

/// Half-width of the lane bloom particles may drift across: the outermost
/// line lane, but never narrower than one lane either side.
pub fn lane_envelope(line_count: u32) -> f32 {
    (line_count.saturating_sub(1) as f32 / 2.0).max(1.0)
}

/// Rebuilds both buffers from scratch for `routes`.
pub fn build_geometry<R: Rng + ?Sized>(
    routes: &[Route],
    options: ParticleOptions,
    config: &GeometryConfig,
    rng: &mut R,
) -> FlowGeometry {
    let segments = config.segments_per_line.max(1);
    let mut lines = Vec::new();
    let mut particles = Vec::new();

    for route in routes {
        let start = route.start.to_f32();
        let end = route.end.to_f32();
        let traffic = route.kind.tag();
        let tier = tier_for_rank(route.rank);
        let envelope = lane_envelope(tier.line_count);

        for lane in lane_offsets(tier.line_count) {
            for s in 0..segments {
                let segment = [s as f32 / segments as f32, (s + 1) as f32 / segments as f32];
                for side in [0.0, 1.0] {
                    lines.push(LineVertex {
                        start,
                        end,
                        segment,
                        side,
                        lane,
                        traffic,
                    });
                }
            }
        }

        for _ in 0..particle_count(route.rank, options, config) {
            particles.push(ParticleInstance {
                start,
                end,
                speed: config.particle_base_speed,
                phase: rng.random::<f32>(),
                traffic,
                rank: route.rank as f32,
                lane: rng.random_range(-1.0f32..=1.0) * envelope,
            });
        }
    }

    tracing::debug!(
        routes = routes.len(),
        line_vertices = lines.len(),
        particles = particles.len(),
        "rebuilt flow geometry"
    );

    FlowGeometry { lines, particles }
}

#[cfg(test)]
mod tests {
    use super::{
        GeometryConfig, ParticleOptions, build_geometry, lane_envelope, lane_offsets,
        particle_count,
    };
    use crate::routes::{Route, TrafficKind, rank_routes};
    use crate::tiers::tier_for_rank;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn routes(n: usize) -> Vec<Route> {
        let mut routes: Vec<Route> = (0..n)
            .map(|i| Route {
                from: i as u32,
                to: i as u32 + 1,
                start: Vec2::new(i as f64, 0.0),
                end: Vec2::new(i as f64 + 10.0, 5.0),
                kind: if i % 2 == 0 {
                    TrafficKind::General
                } else {
                    TrafficKind::Hidden
                },
                score: (n - i) as f64,
                rank: 0.0,
            })
            .collect();
        rank_routes(&mut routes);
        routes
    }

    #[test]
    fn lanes_are_centered_on_zero() {
        assert_eq!(lane_offsets(1).collect::<Vec<_>>(), vec![0.0]);
        assert_eq!(lane_offsets(2).collect::<Vec<_>>(), vec![-0.5, 0.5]);
        assert_eq!(lane_offsets(5).collect::<Vec<_>>(), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(lane_offsets(0).count(), 0);
    }

    #[test]
    fn line_vertex_count_follows_tiers() {
        let routes = routes(200);
        let config = GeometryConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let geom = build_geometry(&routes, ParticleOptions::default(), &config, &mut rng);

        let expected: usize = routes
            .iter()
            .map(|r| tier_for_rank(r.rank).line_count as usize * 8 * 2)
            .sum();
        assert_eq!(geom.lines.len(), expected);
    }

    #[test]
    fn segments_cover_unit_interval() {
        let routes = routes(1);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let geom = build_geometry(&routes, ParticleOptions::default(), &GeometryConfig::default(), &mut rng);

        // Singleton route has rank 0: five lanes of eight segments.
        assert_eq!(geom.lines.len(), 5 * 8 * 2);
        let first_lane = &geom.lines[..16];
        assert_eq!(first_lane[0].segment, [0.0, 0.125]);
        assert_eq!(first_lane[0].side, 0.0);
        assert_eq!(first_lane[1].side, 1.0);
        assert_eq!(first_lane[15].segment, [0.875, 1.0]);
        assert!(first_lane.iter().all(|v| v.lane == -2.0));
        assert!(geom.lines.iter().all(|v| v.start == [0.0, 0.0] && v.end == [10.0, 5.0]));
    }

    #[test]
    fn particles_carry_rank_phase_and_lane() {
        let routes = routes(50);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let geom = build_geometry(&routes, ParticleOptions::default(), &GeometryConfig::default(), &mut rng);

        assert!(!geom.particles.is_empty());
        for p in &geom.particles {
            let envelope = lane_envelope(tier_for_rank(p.rank as f64).line_count);
            assert!((0.0..1.0).contains(&p.phase));
            assert!(p.lane.abs() <= envelope);
            assert!((0.0..=1.0).contains(&p.rank));
            assert_eq!(p.speed, 60.0);
        }
        assert!(geom.particles.iter().any(|p| p.traffic == 1.0));
        assert!(geom.particles.iter().any(|p| p.traffic == 0.0));
    }

    #[test]
    fn envelope_spans_the_outer_lanes() {
        assert_eq!(lane_envelope(1), 1.0);
        assert_eq!(lane_envelope(3), 1.0);
        assert_eq!(lane_envelope(4), 1.5);
        assert_eq!(lane_envelope(5), 2.0);
    }

    #[test]
    fn top_tier_particles_fill_the_whole_bloom() {
        let routes = routes(1);
        let dense = ParticleOptions {
            count_factor: 40.0,
            ..ParticleOptions::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let geom = build_geometry(&routes, dense, &GeometryConfig::default(), &mut rng);

        assert_eq!(geom.particles.len(), 240);
        assert!(geom.particles.iter().all(|p| p.lane.abs() <= 2.0));
        assert!(geom.particles.iter().any(|p| p.lane > 1.0));
        assert!(geom.particles.iter().any(|p| p.lane < -1.0));
    }

    #[test]
    fn particle_counts_scale_with_rank_and_factor() {
        let config = GeometryConfig::default();
        let scaled = ParticleOptions::default();
        assert_eq!(particle_count(0.0, scaled, &config), 6);
        assert_eq!(particle_count(0.9, scaled, &config), 1);

        let doubled = ParticleOptions {
            count_factor: 2.0,
            ..scaled
        };
        assert_eq!(particle_count(0.0, doubled, &config), 12);

        let tiny = ParticleOptions {
            count_factor: 0.01,
            ..scaled
        };
        assert_eq!(particle_count(0.9, tiny, &config), 1);

        let off = ParticleOptions {
            count_factor: 0.0,
            ..scaled
        };
        assert_eq!(particle_count(0.0, off, &config), 0);
    }

    #[test]
    fn unscaled_particles_ignore_rank() {
        let config = GeometryConfig::default();
        let flat = ParticleOptions {
            count_factor: 1.0,
            scale_by_bandwidth: false,
        };
        assert_eq!(particle_count(0.0, flat, &config), 2);
        assert_eq!(particle_count(1.0, flat, &config), 2);

        let routes = routes(30);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let geom = build_geometry(&routes, flat, &config, &mut rng);
        assert_eq!(geom.particles.len(), 60);
    }

    #[test]
    fn empty_routes_build_empty_buffers() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let geom = build_geometry(&[], ParticleOptions::default(), &GeometryConfig::default(), &mut rng);
        assert!(geom.is_empty());
    }

    #[test]
    fn vertex_layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<super::LineVertex>(), 9 * 4);
        assert_eq!(std::mem::size_of::<super::ParticleInstance>(), 9 * 4);
    }
}
