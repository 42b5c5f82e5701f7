use std::collections::BTreeSet;

use foundation::math::{Vec2, clamp_latitude, project};
use serde::{Deserialize, Serialize};

use crate::node::{Centroid, Node, RawNode, sanitize_bandwidth};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// One projected node per raw node.
    #[default]
    City,
    /// Raw nodes folded into their nearest country centroid.
    Country,
}

/// Projected nodes plus the reverse mapping back to raw node indices.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Aggregation {
    pub nodes: Vec<Node>,
    /// `groups[i]` lists the raw indices folded into `nodes[i]`. `None` when
    /// nodes are one-to-one with raw nodes.
    pub groups: Option<Vec<Vec<u32>>>,
}

impl Aggregation {
    pub fn is_grouped(&self) -> bool {
        self.groups.is_some()
    }

    /// Maps aggregated node indices back to raw node indices, de-duplicated
    /// and sorted.
    pub fn expand(&self, indices: impl IntoIterator<Item = u32>) -> Vec<u32> {
        let mut out = BTreeSet::new();
        match &self.groups {
            None => out.extend(indices),
            Some(groups) => {
                for idx in indices {
                    if let Some(members) = groups.get(idx as usize) {
                        out.extend(members.iter().copied());
                    }
                }
            }
        }
        out.into_iter().collect()
    }
}

pub fn aggregate(
    raw: &[RawNode],
    mode: PathMode,
    centroids: Option<&[Centroid]>,
    tile_size: f64,
) -> Aggregation {
    match (mode, centroids) {
        (PathMode::Country, Some(centroids)) if !centroids.is_empty() => {
            aggregate_by_country(raw, centroids, tile_size)
        }
        (PathMode::Country, _) => {
            tracing::warn!("country mode requested without centroids; using city nodes");
            per_city(raw, tile_size)
        }
        (PathMode::City, _) => per_city(raw, tile_size),
    }
}

fn per_city(raw: &[RawNode], tile_size: f64) -> Aggregation {
    let nodes = raw
        .iter()
        .map(|n| Node {
            position: project(n.lng, clamp_latitude(n.lat), tile_size),
            hidden_service_dir: n.hidden_service_dir,
            bandwidth: sanitize_bandwidth(n.bandwidth),
        })
        .collect();
    Aggregation {
        nodes,
        groups: None,
    }
}

#[derive(Debug, Default, Clone)]
struct Group {
    members: Vec<u32>,
    bandwidth_sum: f64,
    hidden_service_dir: bool,
}

fn aggregate_by_country(raw: &[RawNode], centroids: &[Centroid], tile_size: f64) -> Aggregation {
    let mut groups: Vec<Group> = vec![Group::default(); centroids.len()];

    for (raw_idx, n) in raw.iter().enumerate() {
        let Some(nearest) = nearest_centroid(n, centroids) else {
            continue;
        };
        let group = &mut groups[nearest];
        group.members.push(raw_idx as u32);
        group.bandwidth_sum += sanitize_bandwidth(n.bandwidth);
        group.hidden_service_dir |= n.hidden_service_dir;
    }

    let mut nodes = Vec::new();
    let mut members = Vec::new();
    for (centroid, group) in centroids.iter().zip(groups) {
        if group.members.is_empty() {
            continue;
        }
        nodes.push(Node {
            position: project(centroid.lng, clamp_latitude(centroid.lat), tile_size),
            hidden_service_dir: group.hidden_service_dir,
            bandwidth: group.bandwidth_sum / group.members.len() as f64,
        });
        members.push(group.members);
    }

    tracing::debug!(
        raw = raw.len(),
        countries = nodes.len(),
        "aggregated nodes by country"
    );

    Aggregation {
        nodes,
        groups: Some(members),
    }
}

/// Squared distance in degrees; ties go to the earlier centroid.
fn nearest_centroid(n: &RawNode, centroids: &[Centroid]) -> Option<usize> {
    let at = Vec2::new(n.lng, n.lat);
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in centroids.iter().enumerate() {
        let d2 = at.distance_sq(Vec2::new(c.lng, c.lat));
        if best.is_none_or(|(_, b)| d2 < b) {
            best = Some((i, d2));
        }
    }
    best.map(|(i, _)| i)
}
