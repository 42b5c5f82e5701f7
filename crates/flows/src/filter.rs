use crate::aggregate::Aggregation;
use crate::routes::Route;

/// Highest-ranked prefix of `routes` covering `density` of the set.
///
/// `routes` must already be in descending-score order.
pub fn density_prefix(routes: &[Route], density: f64) -> &[Route] {
    let density = if density.is_finite() {
        density.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let keep = (routes.len() as f64 * density).round() as usize;
    &routes[..keep.min(routes.len())]
}

/// Raw node indices referenced by `routes`, de-duplicated and sorted.
pub fn visible_nodes(routes: &[Route], aggregation: &Aggregation) -> Vec<u32> {
    aggregation.expand(routes.iter().flat_map(|r| [r.from, r.to]))
}

#[cfg(test)]
mod tests {
    use super::{density_prefix, visible_nodes};
    use crate::aggregate::Aggregation;
    use crate::routes::{Route, TrafficKind};
    use foundation::math::Vec2;

    fn route(from: u32, to: u32, score: f64) -> Route {
        Route {
            from,
            to,
            start: Vec2::default(),
            end: Vec2::default(),
            kind: TrafficKind::General,
            score,
            rank: 0.0,
        }
    }

    #[test]
    fn density_keeps_highest_ranked_prefix() {
        let routes: Vec<Route> = (0..10).map(|i| route(i, i + 1, 10.0 - i as f64)).collect();
        assert_eq!(density_prefix(&routes, 1.0).len(), 10);
        assert_eq!(density_prefix(&routes, 0.5).len(), 5);
        assert_eq!(density_prefix(&routes, 0.0).len(), 0);
        assert_eq!(density_prefix(&routes, 0.34)[2].score, 8.0);
    }

    #[test]
    fn out_of_range_density_is_clamped() {
        let routes: Vec<Route> = (0..4).map(|i| route(i, i + 1, 1.0)).collect();
        assert_eq!(density_prefix(&routes, 3.0).len(), 4);
        assert_eq!(density_prefix(&routes, -1.0).len(), 0);
        assert_eq!(density_prefix(&routes, f64::NAN).len(), 4);
    }

    #[test]
    fn visible_nodes_are_deduplicated() {
        let routes = vec![route(4, 1, 3.0), route(1, 2, 2.0), route(2, 4, 1.0)];
        let city = Aggregation::default();
        assert_eq!(visible_nodes(&routes, &city), vec![1, 2, 4]);
    }

    #[test]
    fn visible_nodes_expand_country_groups() {
        let routes = vec![route(0, 1, 1.0)];
        let country = Aggregation {
            nodes: Vec::new(),
            groups: Some(vec![vec![3, 5], vec![0], vec![9]]),
        };
        assert_eq!(visible_nodes(&routes, &country), vec![0, 3, 5]);
    }
}
