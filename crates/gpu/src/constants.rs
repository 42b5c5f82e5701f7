use serde::{Deserialize, Serialize};

/// Tuned visual constants that only the shaders consume.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConstants {
    /// Particle diameter in CSS pixels before size, rank and zoom scaling.
    pub particle_size_px: f32,
    /// Peak lane displacement per unit lane offset, as a fraction of route length.
    pub lane_spread: f32,
    /// Lines are drawn fainter than particles.
    pub line_alpha: f32,
    pub general_color: [f32; 4],
    pub hidden_color: [f32; 4],
    /// Transparent by default so the base map shows through.
    pub clear_color: [f64; 4],
}

impl Default for RenderConstants {
    fn default() -> Self {
        Self {
            particle_size_px: 2.5,
            lane_spread: 0.04,
            line_alpha: 0.35,
            general_color: [0.24, 0.74, 0.97, 1.0],
            hidden_color: [0.93, 0.36, 0.86, 1.0],
            clear_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

impl RenderConstants {
    pub fn clear(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}
