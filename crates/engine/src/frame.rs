use foundation::math::{Vec2, clamp_latitude, project};

use crate::settings::Settings;
use crate::view::ViewState;

/// Everything the draw calls of one frame need, derived from view and
/// settings. Nothing here touches route or vertex data.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameParams {
    pub elapsed_s: f64,
    pub zoom: f64,
    /// `2^zoom`: tile-space units to CSS pixels.
    pub scale: f64,
    /// Camera center in scaled pixel space.
    pub center_px: Vec2,
    /// Viewport in CSS pixels.
    pub viewport: Vec2,
    pub opacity: f64,
    pub traffic_filter: u32,
    pub path_width: f64,
    pub speed: f64,
    pub scale_by_zoom: bool,
    pub size: f64,
}

pub fn frame_params(
    view: &ViewState,
    settings: &Settings,
    elapsed_s: f64,
    tile_size: f64,
) -> FrameParams {
    let scale = 2f64.powf(view.zoom);
    let center = project(view.longitude, clamp_latitude(view.latitude), tile_size);
    FrameParams {
        elapsed_s,
        zoom: view.zoom,
        scale,
        center_px: center * scale,
        viewport: Vec2::new(view.width, view.height),
        opacity: settings.opacity.clamp(0.0, 1.0),
        traffic_filter: settings.traffic_type.uniform(),
        path_width: settings.path_width.max(0.0),
        speed: settings.speed.max(0.0),
        scale_by_zoom: settings.scale_by_zoom,
        size: settings.size.max(0.0),
    }
}
