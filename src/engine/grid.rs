use ndarray::{Array1, Array2};
use tracing::debug;

use crate::engine::buckets;
use crate::engine::poisson;
use crate::engine::simulator::MiningSimulator;

/// Block target at which blending is fully long-horizon.
const BLEND_HORIZON_BLOCKS: f64 = 144.0;

/// Precomputed simulation grid for one estimator configuration.
///
/// Holds the Poisson block budgets for every (target, confidence) pair
/// so repeated `calculate` calls only pay for the mining simulations.
pub(crate) struct EstimateGrid {
    confidence_levels: Vec<f64>,
    block_targets: Vec<f64>,
    budgets: Array2<usize>,
    simulator: MiningSimulator,
}

impl EstimateGrid {
    pub(crate) fn new(confidence_levels: Vec<f64>, block_targets: Vec<f64>) -> Self {
        let budgets = poisson::block_budgets(&block_targets, &confidence_levels);
        Self {
            confidence_levels,
            block_targets,
            budgets,
            simulator: MiningSimulator::new(),
        }
    }

    /// Produces the final fee-rate matrix (targets x confidence levels)
    /// in sat/vB, with `None` where no usable estimate exists.
    pub(crate) fn fee_rates(
        &self,
        latest: &Array1<f64>,
        short_inflow: &Array1<f64>,
        long_inflow: &Array1<f64>,
    ) -> Array2<Option<f64>> {
        // Half a short window of inflow pads the newest snapshot against
        // undersampling of the current mempool.
        let buffered = latest + &(short_inflow / 2.0);

        let short_term = self.simulate_grid(&buffered, short_inflow);
        let long_term = self.simulate_grid(&buffered, long_inflow);

        let mut rates = self
            .blended(&short_term, &long_term)
            .mapv(|index| (index / 100.0).exp());
        self.cap_to_shorter_targets(&mut rates);

        debug!(
            targets = self.block_targets.len(),
            confidence_levels = self.confidence_levels.len(),
            "estimate grid complete"
        );

        self.bounded(&rates)
    }

    /// Runs the mining simulation for every grid cell, yielding bucket
    /// indices as floats ready for blending.
    fn simulate_grid(&self, backlog: &Array1<f64>, inflow: &Array1<f64>) -> Array2<f64> {
        let shape = (self.block_targets.len(), self.confidence_levels.len());
        let mut indices = Array2::zeros(shape);

        for (i, &target) in self.block_targets.iter().enumerate() {
            // Fractional targets are truncated toward zero.
            let target_blocks = target as usize;

            for j in 0..self.confidence_levels.len() {
                let cleared = self.simulator.cheapest_mined_bucket(
                    backlog,
                    inflow,
                    self.budgets[[i, j]],
                    target_blocks,
                );
                // A cell without an estimate blends as the floor bucket.
                indices[[i, j]] = cleared.unwrap_or(0) as f64;
            }
        }

        indices
    }

    /// Blends the two horizons in bucket-index space. The long-horizon
    /// share grows quadratically with the target and saturates at 144
    /// blocks, where the long estimate stands alone.
    fn blended(&self, short_term: &Array2<f64>, long_term: &Array2<f64>) -> Array2<f64> {
        let mut blended = Array2::zeros(short_term.dim());

        for (i, &target) in self.block_targets.iter().enumerate() {
            let long_share =
                (1.0 - (1.0 - target / BLEND_HORIZON_BLOCKS).powi(2)).clamp(0.0, 1.0);

            for j in 0..self.confidence_levels.len() {
                blended[[i, j]] = short_term[[i, j]] * (1.0 - long_share)
                    + long_term[[i, j]] * long_share;
            }
        }

        blended
    }

    /// A longer target may never demand a higher fee than a shorter one;
    /// each column is clamped to be non-increasing in given target order.
    fn cap_to_shorter_targets(&self, rates: &mut Array2<f64>) {
        for j in 0..self.confidence_levels.len() {
            let mut ceiling = f64::INFINITY;
            for i in 0..self.block_targets.len() {
                if rates[[i, j]] > ceiling {
                    rates[[i, j]] = ceiling;
                }
                ceiling = rates[[i, j]];
            }
        }
    }

    /// Restricts rates to the open interval (1.0, max). Floor-bucket
    /// results carry no signal (the simulation saw nothing worth paying
    /// for) and blends at or past the top bucket are not representable;
    /// both are reported as absent.
    fn bounded(&self, rates: &Array2<f64>) -> Array2<Option<f64>> {
        let ceiling = buckets::max_fee_rate();
        rates.mapv(|rate| (rate > 1.0 && rate < ceiling).then_some(rate))
    }
}
