use protocol::ViewPatch;

/// Camera and viewport, mutated in place on every host camera move.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    /// Viewport size in CSS pixels.
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 20.0,
            zoom: 1.5,
            width: 1.0,
            height: 1.0,
            device_pixel_ratio: 1.0,
        }
    }
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite() && *v > 0.0)
}

impl ViewState {
    /// Merges the fields present in `patch`. Returns `true` when the viewport
    /// size or pixel ratio changed and the backing store must follow.
    pub fn apply(&mut self, patch: &ViewPatch) -> bool {
        if let Some(v) = patch.longitude.filter(|v| v.is_finite()) {
            self.longitude = v;
        }
        if let Some(v) = patch.latitude.filter(|v| v.is_finite()) {
            self.latitude = v;
        }
        if let Some(v) = patch.zoom.filter(|v| v.is_finite()) {
            self.zoom = v;
        }
        self.resize(patch.width, patch.height, patch.device_pixel_ratio)
    }

    /// Applies whichever dimensions are present and valid.
    pub fn resize(&mut self, width: Option<f64>, height: Option<f64>, dpr: Option<f64>) -> bool {
        let before = (self.width, self.height, self.device_pixel_ratio);
        if let Some(w) = positive(width) {
            self.width = w;
        }
        if let Some(h) = positive(height) {
            self.height = h;
        }
        if let Some(r) = positive(dpr) {
            self.device_pixel_ratio = r;
        }
        before != (self.width, self.height, self.device_pixel_ratio)
    }

    /// Backing-store size in physical pixels, at least 1×1.
    pub fn backing_size(&self) -> (u32, u32) {
        let w = (self.width * self.device_pixel_ratio).round().max(1.0);
        let h = (self.height * self.device_pixel_ratio).round().max(1.0);
        (w as u32, h as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::ViewState;
    use protocol::ViewPatch;

    #[test]
    fn apply_merges_only_present_fields() {
        let mut view = ViewState::default();
        let resized = view.apply(&ViewPatch {
            zoom: Some(4.0),
            ..ViewPatch::default()
        });
        assert!(!resized);
        assert_eq!(view.zoom, 4.0);
        assert_eq!(view.latitude, ViewState::default().latitude);
    }

    #[test]
    fn resize_reports_changes_and_ignores_invalid_sizes() {
        let mut view = ViewState::default();
        assert!(view.resize(Some(800.0), Some(600.0), Some(2.0)));
        assert!(!view.resize(Some(800.0), None, None));
        assert!(!view.resize(Some(0.0), Some(-5.0), Some(f64::NAN)));
        assert_eq!(view.backing_size(), (1600, 1200));
    }

    #[test]
    fn backing_size_is_never_zero() {
        let view = ViewState {
            width: 0.2,
            height: 0.2,
            ..ViewState::default()
        };
        assert_eq!(view.backing_size(), (1, 1));
    }
}
