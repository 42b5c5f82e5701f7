use engine::FrameParams;

use crate::constants::RenderConstants;

/// Mirrors `struct Globals` in [`crate::shaders::GLOBALS`]. Every field is
/// four bytes and vec2/vec4 members sit on their std140 alignment, so the
/// Rust layout has no implicit padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    /// Camera center in tile space.
    pub center: [f32; 2],
    pub viewport: [f32; 2],
    pub scale: f32,
    pub zoom: f32,
    pub time: f32,
    pub opacity: f32,
    pub path_width: f32,
    pub speed: f32,
    pub size: f32,
    pub traffic_filter: u32,
    pub scale_by_zoom: u32,
    pub lane_spread: f32,
    pub particle_size: f32,
    pub line_alpha: f32,
    pub general_color: [f32; 4],
    pub hidden_color: [f32; 4],
}

impl Globals {
    pub fn new(params: &FrameParams, constants: &RenderConstants) -> Self {
        // Shipping the tile-space center keeps f32 precision at deep zoom;
        // the pixel-space center grows with 2^zoom.
        let scale = if params.scale > 0.0 { params.scale } else { 1.0 };
        let center = params.center_px * (1.0 / scale);
        Self {
            center: center.to_f32(),
            viewport: [
                params.viewport.x.max(1.0) as f32,
                params.viewport.y.max(1.0) as f32,
            ],
            scale: scale as f32,
            zoom: params.zoom as f32,
            time: params.elapsed_s as f32,
            opacity: params.opacity as f32,
            path_width: params.path_width as f32,
            speed: params.speed as f32,
            size: params.size as f32,
            traffic_filter: params.traffic_filter,
            scale_by_zoom: u32::from(params.scale_by_zoom),
            lane_spread: constants.lane_spread,
            particle_size: constants.particle_size_px,
            line_alpha: constants.line_alpha,
            general_color: constants.general_color,
            hidden_color: constants.hidden_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Globals;
    use crate::constants::RenderConstants;
    use engine::{Settings, ViewState, frame_params};
    use foundation::math::{TILE_SIZE, project};
    use pretty_assertions::assert_eq;
    use protocol::TrafficFilter;

    #[test]
    fn layout_matches_wgsl_struct() {
        assert_eq!(std::mem::size_of::<Globals>(), 96);
        assert_eq!(std::mem::size_of::<Globals>() % 16, 0);
    }

    #[test]
    fn center_is_sent_in_tile_space() {
        let view = ViewState {
            longitude: 30.0,
            latitude: 10.0,
            zoom: 12.0,
            ..ViewState::default()
        };
        let params = frame_params(&view, &Settings::default(), 1.5, TILE_SIZE);
        let globals = Globals::new(&params, &RenderConstants::default());

        let expected = project(30.0, 10.0, TILE_SIZE).to_f32();
        assert!((globals.center[0] - expected[0]).abs() < 1e-3);
        assert!((globals.center[1] - expected[1]).abs() < 1e-3);
        assert_eq!(globals.scale, 4096.0);
        assert_eq!(globals.time, 1.5);
    }

    #[test]
    fn settings_flow_into_uniforms() {
        let settings = Settings {
            traffic_type: TrafficFilter::Hidden,
            scale_by_zoom: false,
            ..Settings::default()
        };
        let params = frame_params(&ViewState::default(), &settings, 0.0, TILE_SIZE);
        let constants = RenderConstants::default();
        let globals = Globals::new(&params, &constants);

        assert_eq!(globals.traffic_filter, 1);
        assert_eq!(globals.scale_by_zoom, 0);
        assert_eq!(globals.opacity, 0.6);
        assert_eq!(globals.particle_size, constants.particle_size_px);
        assert_eq!(globals.hidden_color, constants.hidden_color);
    }
}
