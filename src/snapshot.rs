use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::buckets;
use crate::transaction::MempoolTransaction;

/// A point-in-time census of the mempool, grouped by fee-rate bucket.
///
/// Snapshots are what callers feed into [`crate::Estimator::calculate`].
/// The bucket keys come from the crate's logarithmic fee-rate scale;
/// a snapshot built through [`MempoolSnapshot::from_transactions`] always
/// carries valid keys, while hand-built maps may contain anything (only
/// indices in `[0, 1000]` contribute to estimation).
///
/// The triple `(block_height, timestamp, bucketed_weights)` is also the
/// portable persisted form; the serde derives produce exactly that shape.
///
/// # Example
/// ```
/// use fee_compass::{MempoolSnapshot, MempoolTransaction};
/// use chrono::Utc;
///
/// let snapshot = MempoolSnapshot::from_transactions(
///     &[
///         MempoolTransaction::new(400, 1000), // 10 sat/vB
///         MempoolTransaction::new(600, 1200), // 8 sat/vB
///     ],
///     850_000,
///     Utc::now(),
/// );
/// assert_eq!(snapshot.total_weight(), 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolSnapshot {
    /// Chain tip height when the snapshot was taken.
    pub block_height: u32,

    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Fee-rate bucket index to total weight in that bucket.
    pub bucketed_weights: BTreeMap<i32, u64>,
}

impl MempoolSnapshot {
    /// Wraps an already-bucketed weight map.
    pub fn new(
        block_height: u32,
        timestamp: DateTime<Utc>,
        bucketed_weights: BTreeMap<i32, u64>,
    ) -> Self {
        Self {
            block_height,
            timestamp,
            bucketed_weights,
        }
    }

    /// Buckets raw transactions by fee rate and wraps the result.
    ///
    /// Transactions without a positive fee rate are dropped.
    pub fn from_transactions(
        transactions: &[MempoolTransaction],
        block_height: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            block_height,
            timestamp,
            bucketed_weights: buckets::bucket_weights(transactions),
        }
    }

    /// A snapshot of an empty mempool.
    pub fn empty(block_height: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            block_height,
            timestamp,
            bucketed_weights: BTreeMap::new(),
        }
    }

    /// Total weight across all buckets.
    pub fn total_weight(&self) -> u64 {
        self.bucketed_weights.values().sum()
    }

    /// Number of occupied fee-rate buckets.
    pub fn bucket_count(&self) -> usize {
        self.bucketed_weights.len()
    }
}
