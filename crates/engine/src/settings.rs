use flows::{ParticleOptions, PathMode};
use protocol::{SettingsPatch, TrafficFilter};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Settings {
    /// Fraction of generated routes to display.
    pub density: f64,
    pub opacity: f64,
    pub speed: f64,
    pub traffic_type: TrafficFilter,
    pub path_mode: PathMode,
    pub hidden_service_probability: f64,
    pub path_width: f64,
    /// Particle-count factor.
    pub particle_count: f64,
    pub size: f64,
    pub scale_by_zoom: bool,
    pub scale_by_bandwidth: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            density: 1.0,
            opacity: 0.6,
            speed: 1.0,
            traffic_type: TrafficFilter::All,
            path_mode: PathMode::City,
            hidden_service_probability: 0.04,
            path_width: 1.0,
            particle_count: 1.0,
            size: 1.0,
            scale_by_zoom: true,
            scale_by_bandwidth: true,
        }
    }
}

/// How much derived state a change invalidates, least to most invasive.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RebuildLevel {
    /// Uniform-only; the next frame picks it up.
    #[default]
    None,
    /// Route membership unchanged; rebuild vertex buffers.
    Buffers,
    /// Re-select the density prefix, then rebuild buffers.
    Refilter,
    /// Re-aggregate nodes and draw a fresh route set.
    Regenerate,
}

fn changed<T: PartialEq>(new: Option<T>, current: T) -> bool {
    new.is_some_and(|v| v != current)
}

/// Classifies `patch` against `current`. Fields that are absent or equal to
/// the current value do not count as changes.
pub fn classify(current: &Settings, patch: &SettingsPatch) -> RebuildLevel {
    let mut level = RebuildLevel::None;

    if changed(patch.path_mode, current.path_mode)
        || changed(
            patch.hidden_service_probability,
            current.hidden_service_probability,
        )
    {
        level = level.max(RebuildLevel::Regenerate);
    }
    if changed(patch.density, current.density) {
        level = level.max(RebuildLevel::Refilter);
    }
    if changed(patch.particle_count, current.particle_count)
        || changed(patch.scale_by_bandwidth, current.scale_by_bandwidth)
    {
        level = level.max(RebuildLevel::Buffers);
    }

    level
}

impl Settings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.density {
            self.density = v;
        }
        if let Some(v) = patch.opacity {
            self.opacity = v;
        }
        if let Some(v) = patch.speed {
            self.speed = v;
        }
        if let Some(v) = patch.traffic_type {
            self.traffic_type = v;
        }
        if let Some(v) = patch.path_mode {
            self.path_mode = v;
        }
        if let Some(v) = patch.hidden_service_probability {
            self.hidden_service_probability = v;
        }
        if let Some(v) = patch.path_width {
            self.path_width = v;
        }
        if let Some(v) = patch.particle_count {
            self.particle_count = v;
        }
        if let Some(v) = patch.size {
            self.size = v;
        }
        if let Some(v) = patch.scale_by_zoom {
            self.scale_by_zoom = v;
        }
        if let Some(v) = patch.scale_by_bandwidth {
            self.scale_by_bandwidth = v;
        }
    }

    pub fn particle_options(&self) -> ParticleOptions {
        ParticleOptions {
            count_factor: self.particle_count,
            scale_by_bandwidth: self.scale_by_bandwidth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RebuildLevel, Settings, classify};
    use flows::PathMode;
    use protocol::{SettingsPatch, TrafficFilter};

    fn patch() -> SettingsPatch {
        SettingsPatch::default()
    }

    #[test]
    fn uniform_only_fields_need_no_rebuild() {
        let s = Settings::default();
        let p = SettingsPatch {
            opacity: Some(0.2),
            speed: Some(3.0),
            traffic_type: Some(TrafficFilter::Hidden),
            path_width: Some(2.0),
            size: Some(1.5),
            scale_by_zoom: Some(false),
            ..patch()
        };
        assert_eq!(classify(&s, &p), RebuildLevel::None);
    }

    #[test]
    fn density_refilters() {
        let s = Settings::default();
        let p = SettingsPatch {
            density: Some(0.5),
            ..patch()
        };
        assert_eq!(classify(&s, &p), RebuildLevel::Refilter);
    }

    #[test]
    fn particle_fields_rebuild_buffers() {
        let s = Settings::default();
        let count = SettingsPatch {
            particle_count: Some(2.0),
            ..patch()
        };
        let scaling = SettingsPatch {
            scale_by_bandwidth: Some(false),
            ..patch()
        };
        assert_eq!(classify(&s, &count), RebuildLevel::Buffers);
        assert_eq!(classify(&s, &scaling), RebuildLevel::Buffers);
    }

    #[test]
    fn structural_fields_regenerate() {
        let s = Settings::default();
        let mode = SettingsPatch {
            path_mode: Some(PathMode::Country),
            ..patch()
        };
        let prob = SettingsPatch {
            hidden_service_probability: Some(0.5),
            ..patch()
        };
        assert_eq!(classify(&s, &mode), RebuildLevel::Regenerate);
        assert_eq!(classify(&s, &prob), RebuildLevel::Regenerate);
    }

    #[test]
    fn most_invasive_change_wins() {
        let s = Settings::default();
        let p = SettingsPatch {
            path_mode: Some(PathMode::Country),
            density: Some(0.2),
            particle_count: Some(3.0),
            opacity: Some(0.1),
            ..patch()
        };
        assert_eq!(classify(&s, &p), RebuildLevel::Regenerate);

        let q = SettingsPatch {
            density: Some(0.2),
            scale_by_bandwidth: Some(false),
            ..patch()
        };
        assert_eq!(classify(&s, &q), RebuildLevel::Refilter);
    }

    #[test]
    fn unchanged_values_are_not_changes() {
        let s = Settings::default();
        let p = SettingsPatch {
            path_mode: Some(PathMode::City),
            density: Some(1.0),
            ..patch()
        };
        assert_eq!(classify(&s, &p), RebuildLevel::None);
    }

    #[test]
    fn apply_touches_only_present_fields() {
        let mut s = Settings::default();
        s.apply(&SettingsPatch {
            opacity: Some(0.9),
            scale_by_zoom: Some(false),
            ..patch()
        });
        assert_eq!(s.opacity, 0.9);
        assert!(!s.scale_by_zoom);
        assert_eq!(
            s,
            Settings {
                opacity: 0.9,
                scale_by_zoom: false,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn levels_are_ordered_by_invasiveness() {
        assert!(RebuildLevel::None < RebuildLevel::Buffers);
        assert!(RebuildLevel::Buffers < RebuildLevel::Refilter);
        assert!(RebuildLevel::Refilter < RebuildLevel::Regenerate);
    }
}
