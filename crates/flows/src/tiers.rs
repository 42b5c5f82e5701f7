/// One level-of-detail band: routes whose rank is below `rank_threshold`
/// (and above the previous band) render this many lines and particles.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tier {
    pub rank_threshold: f64,
    pub line_count: u32,
    pub particle_count: u32,
}

const fn tier(rank_threshold: f64, line_count: u32, particle_count: u32) -> Tier {
    Tier {
        rank_threshold,
        line_count,
        particle_count,
    }
}

/// Ascending by threshold; the last row catches every remaining rank.
pub const TIERS: [Tier; 6] = [
    tier(0.01, 5, 6),
    tier(0.05, 4, 5),
    tier(0.15, 3, 4),
    tier(0.30, 2, 3),
    tier(0.50, 2, 2),
    tier(1.00, 1, 1),
];

pub fn tier_for_rank(rank: f64) -> Tier {
    TIERS
        .iter()
        .copied()
        .find(|t| rank < t.rank_threshold)
        .unwrap_or(TIERS[TIERS.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::{TIERS, tier_for_rank};

    fn counts(rank: f64) -> (u32, u32) {
        let t = tier_for_rank(rank);
        (t.line_count, t.particle_count)
    }

    #[test]
    fn percentile_bands() {
        assert_eq!(counts(0.0), (5, 6));
        assert_eq!(counts(0.005), (5, 6));
        assert_eq!(counts(0.03), (4, 5));
        assert_eq!(counts(0.1), (3, 4));
        assert_eq!(counts(0.2), (2, 3));
        assert_eq!(counts(0.4), (2, 2));
        assert_eq!(counts(0.99), (1, 1));
    }

    #[test]
    fn thresholds_are_exclusive_upper_bounds() {
        assert_eq!(counts(0.01), (4, 5));
        assert_eq!(counts(0.5), (1, 1));
        assert_eq!(counts(1.0), (1, 1));
    }

    #[test]
    fn table_is_ascending_and_tapers() {
        assert!(TIERS.windows(2).all(|w| w[0].rank_threshold < w[1].rank_threshold));
        assert!(TIERS.windows(2).all(|w| w[0].line_count >= w[1].line_count));
        assert!(TIERS.windows(2).all(|w| w[0].particle_count >= w[1].particle_count));
    }
}
