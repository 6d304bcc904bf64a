use std::collections::BTreeMap;

use crate::transaction::MempoolTransaction;

/// Highest bucket index. Fee rates at or above `exp(10)` sat/vB all
/// collapse into this bucket.
pub(crate) const BUCKET_MAX: i32 = 1000;

/// Length of a dense histogram vector.
pub(crate) const BUCKET_COUNT: usize = BUCKET_MAX as usize + 1;

/// Maps a fee rate onto the logarithmic bucket scale.
///
/// `min(round(ln(rate) * 100), BUCKET_MAX)`, where `round` is
/// `f64::round`, i.e. ties go away from zero. The log spacing keeps
/// roughly 1% relative resolution, densest at the low rates where it
/// matters.
///
/// Callers must exclude non-positive rates before calling; `ln` is
/// undefined there.
pub(crate) fn bucket_index(fee_rate: f64) -> i32 {
    debug_assert!(fee_rate > 0.0);
    ((fee_rate.ln() * 100.0).round() as i32).min(BUCKET_MAX)
}

/// Representative fee rate of a bucket, in sat/vB.
pub(crate) fn fee_rate_at(index: i32) -> f64 {
    (index as f64 / 100.0).exp()
}

/// Upper bound of the representable fee-rate range, ~2.69e43 sat/vB.
/// Used only to filter nonsense out of final estimates.
pub(crate) fn max_fee_rate() -> f64 {
    fee_rate_at(BUCKET_MAX)
}

/// Groups transactions into fee-rate buckets, summing weight per bucket.
///
/// Transactions whose fee rate is not strictly positive carry no signal
/// for the logarithmic scale and are skipped.
pub(crate) fn bucket_weights(transactions: &[MempoolTransaction]) -> BTreeMap<i32, u64> {
    let mut buckets: BTreeMap<i32, u64> = BTreeMap::new();

    for tx in transactions {
        let fee_rate = tx.fee_rate();
        if fee_rate > 0.0 {
            *buckets.entry(bucket_index(fee_rate)).or_insert(0) += tx.weight;
        }
    }

    buckets
}
