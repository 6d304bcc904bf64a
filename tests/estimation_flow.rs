//! End-to-end scenarios through the public API, from raw snapshots to
//! fee-table lookups.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fee_compass::{Estimator, MempoolSnapshot, MempoolTransaction};
use float_cmp::assert_approx_eq;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// 400 WU carrying `rate` sat/vB.
fn tx_at_rate(rate: f64) -> MempoolTransaction {
    MempoolTransaction::new(400, (rate * 100.0) as u64)
}

/// A steadily filling mempool: two snapshots per block over `tips`
/// blocks, everything at 10 sat/vB. Each tip starts at `base_weight` WU
/// and gains `growth` WU between its two snapshots.
fn filling_mempool(tips: u32, base_weight: u64, growth: u64) -> Vec<MempoolSnapshot> {
    let mut snapshots = Vec::new();
    for tip in 0..tips {
        let height = 850_000 + tip;
        let opened = base_time() + Duration::seconds(i64::from(tip) * 600);

        for (offset, weight) in [(0, base_weight), (300, base_weight + growth)] {
            let count = weight / 400;
            let txs: Vec<_> = (0..count).map(|_| tx_at_rate(10.0)).collect();
            snapshots.push(MempoolSnapshot::from_transactions(
                &txs,
                height,
                opened + Duration::seconds(offset),
            ));
        }
    }
    snapshots
}

#[test]
fn empty_input_gives_an_empty_table() {
    let table = Estimator::new().calculate(&[], None).unwrap();

    assert!(table.entries.is_empty());
    assert_eq!(table.available_targets(), Vec::<u32>::new());
    for target in [3, 6, 12, 144] {
        for confidence in [0.05, 0.5, 0.95] {
            assert_eq!(table.fee_rate(target, confidence), None);
        }
    }
    assert_eq!(table.nearest_target(6), None);
}

#[test]
fn single_snapshot_gives_no_estimates() {
    // One snapshot means no observable inflow, and a mempool smaller
    // than a block clears to the floor rate, which is not reported.
    let snapshot = MempoolSnapshot::from_transactions(
        &[MempoolTransaction::new(400, 200)],
        850_000,
        base_time(),
    );

    let table = Estimator::new().calculate(&[snapshot], None).unwrap();

    assert!(table.entries.is_empty());
    for target in [3, 6, 9, 12, 18, 24, 36, 48, 72, 96, 144] {
        for confidence in [0.05, 0.20, 0.50, 0.80, 0.95] {
            assert_eq!(table.fee_rate(target, confidence), None);
        }
    }
}

#[test]
fn idle_empty_mempool_gives_no_estimates() {
    let snapshots: Vec<_> = (0..5)
        .map(|i| {
            MempoolSnapshot::empty(850_000 + i, base_time() + Duration::minutes(i64::from(i) * 10))
        })
        .collect();

    let table = Estimator::new().calculate(&snapshots, None).unwrap();

    assert!(table.entries.is_empty());
}

#[test]
fn congested_mempool_prices_above_the_backlog_rate_boundary() {
    // ~9-10 blocks of 10 sat/vB weight with steady inflow: three blocks
    // cannot clear the backlog, so the estimate lands one bucket above
    // the backlog's own rate.
    let table = Estimator::new()
        .calculate(&filling_mempool(6, 36_000_000, 1_000_000), None)
        .unwrap();

    let rate = table.fee_rate(3, 0.5).expect("congested mempool estimate");
    // Bucket 231, one notch over 10 sat/vB.
    assert_approx_eq!(f64, rate, (2.31f64).exp(), epsilon = 1e-9);
}

#[test]
fn table_is_monotone_in_target_and_confidence() {
    let table = Estimator::new()
        .calculate(&filling_mempool(6, 36_000_000, 2_000_000), None)
        .unwrap();

    let targets = table.available_targets();
    assert!(!targets.is_empty(), "expected at least one populated row");

    for &confidence in Estimator::DEFAULT_CONFIDENCE_LEVELS {
        let mut previous = f64::INFINITY;
        for &target in &targets {
            if let Some(rate) = table.fee_rate(target, confidence) {
                assert!(
                    rate <= previous,
                    "target {target} at {confidence} rose: {rate} > {previous}"
                );
                previous = rate;
            }
        }
    }

    for &target in &targets {
        let mut previous = 0.0;
        for &confidence in Estimator::DEFAULT_CONFIDENCE_LEVELS {
            if let Some(rate) = table.fee_rate(target, confidence) {
                assert!(
                    rate >= previous,
                    "confidence {confidence} at target {target} fell: {rate} < {previous}"
                );
                previous = rate;
            }
        }
    }
}

#[test]
fn snapshot_order_does_not_matter() {
    let ordered = filling_mempool(6, 36_000_000, 1_000_000);

    let mut scrambled = ordered.clone();
    scrambled.reverse();
    scrambled.swap(1, 8);
    scrambled.rotate_left(5);

    let estimator = Estimator::new();
    let from_ordered = estimator.calculate(&ordered, None).unwrap();
    let from_scrambled = estimator.calculate(&scrambled, None).unwrap();

    assert_eq!(from_ordered, from_scrambled);
}

#[test]
fn table_carries_the_newest_snapshot_timestamp() {
    let snapshots = filling_mempool(3, 8_000_000, 500_000);
    let newest = snapshots
        .iter()
        .map(|s| s.timestamp)
        .max()
        .unwrap();

    let table = Estimator::new().calculate(&snapshots, None).unwrap();

    assert_eq!(table.timestamp, newest);
}

#[test]
fn custom_target_yields_a_single_row() {
    let snapshots = filling_mempool(6, 36_000_000, 1_000_000);

    let table = Estimator::new().calculate(&snapshots, Some(4.0)).unwrap();

    assert_eq!(table.available_targets(), vec![4]);
    assert!(table.fee_rate(4, 0.5).is_some());
    assert_eq!(table.fee_rate(3, 0.5), None);
}

#[test]
fn stale_history_does_not_leak_into_short_horizon() {
    // A day-old burst of high-rate weight followed by a calm recent
    // stretch: the burst sits outside both inflow windows' per-tip
    // deltas only if window clipping works; with clipping intact the
    // recent calm data alone decides, and nothing prices near the
    // burst's 1000 sat/vB.
    let mut snapshots = Vec::new();
    let burst_time = base_time() - Duration::hours(30);
    for (offset, weight) in [(0u32, 10u64), (1, 50_000_000)] {
        let txs: Vec<_> = (0..weight / 400).map(|_| tx_at_rate(1000.0)).collect();
        snapshots.push(MempoolSnapshot::from_transactions(
            &txs,
            849_000,
            burst_time + Duration::minutes(i64::from(offset) * 5),
        ));
    }
    snapshots.extend(filling_mempool(3, 4_000_000, 100_000));

    let table = Estimator::new().calculate(&snapshots, None).unwrap();

    for target in table.available_targets() {
        for confidence in table.available_confidence_levels() {
            if let Some(rate) = table.fee_rate(target, confidence) {
                assert!(
                    rate < 500.0,
                    "stale burst leaked into estimate: {rate} sat/vB"
                );
            }
        }
    }
}

#[test]
fn reconfigured_estimator_reports_its_own_targets() {
    let estimator = Estimator::new()
        .reconfigure()
        .block_targets(vec![5.0, 10.0])
        .confidence_levels(vec![0.5])
        .build()
        .unwrap();

    let table = estimator
        .calculate(&filling_mempool(6, 36_000_000, 1_000_000), None)
        .unwrap();

    for target in table.available_targets() {
        assert!(target == 5 || target == 10, "unexpected target {target}");
    }
    assert_eq!(table.available_confidence_levels(), vec![0.5]);
}
