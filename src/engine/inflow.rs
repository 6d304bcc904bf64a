use std::collections::BTreeMap;

use chrono::Duration;
use ndarray::Array1;
use tracing::trace;

use crate::engine::buckets::BUCKET_COUNT;
use crate::engine::histogram::DenseSnapshot;

/// Derives the expected new weight arriving per bucket, normalized to a
/// 10-minute interval, from the snapshots inside `window`.
///
/// Snapshots are partitioned by block height so that confirmations do
/// not masquerade as negative arrivals: within one tip, weight only
/// leaves through eviction or replacement, and comparing the first and
/// last snapshot per tip isolates the net arrival pattern. Per-bucket
/// decreases are clamped to zero.
///
/// Degenerate input (no snapshots, one snapshot per tip, zero observed
/// span) yields the zero vector; nothing here errors.
pub(crate) fn expected_inflow(snapshots: &[DenseSnapshot], window: Duration) -> Array1<f64> {
    let mut ordered: Vec<&DenseSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let Some(newest) = ordered.last() else {
        return Array1::zeros(BUCKET_COUNT);
    };
    let horizon = newest.timestamp - window;

    let mut by_height: BTreeMap<u32, Vec<&DenseSnapshot>> = BTreeMap::new();
    for snapshot in ordered.iter().copied().filter(|s| s.timestamp >= horizon) {
        by_height
            .entry(snapshot.block_height)
            .or_default()
            .push(snapshot);
    }

    let mut inflow = Array1::zeros(BUCKET_COUNT);
    let mut observed_span = Duration::zero();

    for tip_snapshots in by_height.values() {
        if tip_snapshots.len() < 2 {
            continue;
        }
        // Push-order equals timestamp order, so first/last bound the tip.
        let first = tip_snapshots[0];
        let last = tip_snapshots[tip_snapshots.len() - 1];

        observed_span = observed_span + (last.timestamp - first.timestamp);

        let delta = &last.weights - &first.weights;
        for (total, arrived) in inflow.iter_mut().zip(delta.iter()) {
            if *arrived > 0.0 {
                *total += arrived;
            }
        }
    }

    let span_seconds = observed_span.num_seconds();
    if span_seconds > 0 {
        inflow *= Duration::minutes(10).num_seconds() as f64 / span_seconds as f64;
    }

    trace!(
        tips = by_height.len(),
        span_seconds,
        total_inflow = inflow.sum(),
        "derived inflow vector"
    );

    inflow
}
