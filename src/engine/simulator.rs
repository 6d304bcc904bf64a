use ndarray::Array1;

use crate::engine::buckets::BUCKET_MAX;

/// Consensus block capacity in weight units.
const BLOCK_CAPACITY_WU: f64 = 4_000_000.0;

/// Greedy block-by-block mining over a reverse-ordered weight histogram.
pub(crate) struct MiningSimulator {
    block_capacity: f64,
}

impl MiningSimulator {
    pub(crate) fn new() -> Self {
        Self {
            block_capacity: BLOCK_CAPACITY_WU,
        }
    }

    #[cfg(test)]
    fn with_capacity(block_capacity: f64) -> Self {
        Self { block_capacity }
    }

    /// Mines `budget` blocks over the backlog while new weight keeps
    /// arriving, and reports the plain bucket index of the cheapest fee
    /// rate that was still fully mined.
    ///
    /// Returns `None` when no block can be counted on (`budget` 0), and
    /// `Some(BUCKET_MAX + 1)` when not even the top bucket cleared.
    ///
    /// `inflow` is measured per 10 minutes. With only `budget` blocks
    /// expected in the span that normally yields `target_blocks`, each
    /// simulated block absorbs a `target_blocks / budget` multiple of
    /// that interval's arrivals.
    pub(crate) fn cheapest_mined_bucket(
        &self,
        backlog: &Array1<f64>,
        inflow: &Array1<f64>,
        budget: usize,
        target_blocks: usize,
    ) -> Option<usize> {
        if budget == 0 {
            return None;
        }

        let interval_stretch = target_blocks as f64 / budget as f64;
        let arriving_per_block = inflow * interval_stretch;

        let mut pending = backlog.clone();
        for _ in 0..budget {
            pending += &arriving_per_block;
            self.mine_one(&mut pending);
        }

        Some(Self::cheapest_cleared(&pending))
    }

    /// Drains up to one block of weight, highest fee rate (index 0)
    /// first, emptying each bucket before touching the next.
    fn mine_one(&self, pending: &mut Array1<f64>) {
        let mut capacity_left = self.block_capacity;

        for bucket in pending.iter_mut() {
            let mined = bucket.min(capacity_left);
            *bucket -= mined;
            capacity_left -= mined;
            if capacity_left <= 0.0 {
                break;
            }
        }
    }

    /// Maps the post-mining remainder to a plain bucket index.
    fn cheapest_cleared(pending: &Array1<f64>) -> usize {
        match pending.iter().position(|&weight| weight > 0.0) {
            // Nothing left at all: the floor rate would have sufficed.
            None => 0,
            // Even the top bucket kept weight: out-of-range sentinel.
            Some(0) => BUCKET_MAX as usize + 1,
            // Reverse position q - 1 was the cheapest emptied bucket.
            Some(q) => BUCKET_MAX as usize - (q - 1),
        }
    }
}
