use std::collections::BTreeMap;

/// Rebuild and geometry accounting for the render engine.
///
/// Sorted maps keep snapshots in a stable order for logs and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
}

pub const ROUTES_REGENERATED: &str = "routes.regenerated";
pub const ROUTES_REFILTERED: &str = "routes.refiltered";
pub const GEOMETRY_REBUILT: &str = "geometry.rebuilt";
pub const NODES_AGGREGATED: &str = "nodes.aggregated";

pub const ROUTES_TOTAL: &str = "routes.total";
pub const ROUTES_VISIBLE: &str = "routes.visible";
pub const LINE_VERTICES: &str = "vertices.lines";
pub const PARTICLES: &str = "particles";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}
