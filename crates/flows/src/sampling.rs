use rand::Rng;

/// Inverse-CDF sampler over a fixed set of non-negative weights.
///
/// Each draw is a binary search over the normalized cumulative table, so a
/// draw costs O(log n) regardless of how many candidates exist.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSampler {
    cumulative: Vec<f64>,
}

impl WeightedSampler {
    /// Returns `None` when there is nothing to draw from or the weights sum
    /// to zero.
    pub fn new(weights: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for w in weights {
            total += if w.is_finite() { w.max(0.0) } else { 0.0 };
            cumulative.push(total);
        }
        if cumulative.is_empty() || total <= 0.0 {
            return None;
        }
        for c in &mut cumulative {
            *c /= total;
        }
        // Guard against rounding leaving the tail short of 1.0.
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        Some(Self { cumulative })
    }

    /// Index of the first cumulative entry `>= u`.
    pub fn index_for(&self, u: f64) -> usize {
        let idx = self.cumulative.partition_point(|&c| c < u);
        idx.min(self.cumulative.len() - 1)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index_for(rng.random::<f64>())
    }
}
