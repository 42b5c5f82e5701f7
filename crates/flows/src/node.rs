use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// Geographic node as supplied by the host.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub lng: f64,
    pub lat: f64,
    /// Hidden-service directory flag.
    #[serde(default, rename = "hsdir")]
    pub hidden_service_dir: bool,
    #[serde(default)]
    pub bandwidth: f64,
}

impl RawNode {
    pub fn new(lng: f64, lat: f64, hidden_service_dir: bool, bandwidth: f64) -> Self {
        Self {
            lng,
            lat,
            hidden_service_dir,
            bandwidth,
        }
    }
}

/// A node in tile space, ready for route sampling.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Node {
    pub position: Vec2,
    pub hidden_service_dir: bool,
    /// Non-negative; negative or non-finite host values are clamped to zero.
    pub bandwidth: f64,
}

/// Country centroid used by country-mode aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    #[serde(default)]
    pub code: String,
    pub lng: f64,
    pub lat: f64,
}

impl Centroid {
    pub fn new(code: impl Into<String>, lng: f64, lat: f64) -> Self {
        Self {
            code: code.into(),
            lng,
            lat,
        }
    }
}

pub(crate) fn sanitize_bandwidth(bandwidth: f64) -> f64 {
    if bandwidth.is_finite() {
        bandwidth.max(0.0)
    } else {
        0.0
    }
}
