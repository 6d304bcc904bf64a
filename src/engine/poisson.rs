use ndarray::Array2;
use statrs::distribution::{DiscreteCDF, Poisson};

/// Computes, for every (target, confidence) pair, how many blocks can be
/// counted on within the time that normally produces `target` of them.
///
/// Entry `[i, j]` is the largest `k` with `P[N >= k] >= confidence[j]`
/// for `N ~ Poisson(target[i])`, or 0 when no positive `k` qualifies.
/// The search stops at `4 * target`; beyond that the tail probability is
/// negligible for any workable configuration.
///
/// Targets must already be validated strictly positive.
pub(crate) fn block_budgets(block_targets: &[f64], confidence_levels: &[f64]) -> Array2<usize> {
    let mut budgets = Array2::zeros((block_targets.len(), confidence_levels.len()));

    for (i, &target) in block_targets.iter().enumerate() {
        let arrivals = Poisson::new(target).expect("block targets are validated positive");
        let search_cap = (target * 4.0) as usize;

        for (j, &confidence) in confidence_levels.iter().enumerate() {
            budgets[[i, j]] = assured_blocks(&arrivals, confidence, search_cap);
        }
    }

    budgets
}

fn assured_blocks(arrivals: &Poisson, confidence: f64, search_cap: usize) -> usize {
    let mut assured = 0;
    for k in 1..search_cap {
        // P[N >= k] = 1 - CDF(k - 1), monotone decreasing in k.
        let reach = 1.0 - arrivals.cdf(k as u64 - 1);
        if reach < confidence {
            break;
        }
        assured = k;
    }
    assured
}
