use std::f64::consts::PI;

use super::Vec2;

/// Reference tile size (pixels) of the planar tile space at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude beyond which Web Mercator is conventionally clipped.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Projects longitude/latitude (degrees) into tile space at zoom 0.
///
/// `x` spans `[0, tile_size)` west to east and `y` grows southward. Latitudes
/// of ±90° map to an unbounded `y`; see [`clamp_latitude`].
pub fn project(lng: f64, lat: f64, tile_size: f64) -> Vec2 {
    let k = tile_size / (2.0 * PI);
    let x = k * (lng * PI / 180.0 + PI);
    let y = k * (PI - (PI / 4.0 + lat * PI / 360.0).tan().ln());
    Vec2::new(x, y)
}

pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
}

/// Shifts `end_x` by one tile width when the direct span from `start_x`
/// crosses more than half the world, so the shorter path over the seam is used.
pub fn wrap_end_x(start_x: f64, end_x: f64, tile_size: f64) -> f64 {
    let dx = end_x - start_x;
    if dx > tile_size / 2.0 {
        end_x - tile_size
    } else if dx < -tile_size / 2.0 {
        end_x + tile_size
    } else {
        end_x
    }
}
