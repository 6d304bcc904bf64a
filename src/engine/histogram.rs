use chrono::{DateTime, Utc};
use ndarray::Array1;

use crate::engine::buckets::{BUCKET_COUNT, BUCKET_MAX};
use crate::snapshot::MempoolSnapshot;

/// A snapshot flattened into a dense weight vector for simulation.
///
/// The vector is stored in reverse fee-rate order: index 0 holds the
/// highest-rate bucket. Mining "highest fee first" then becomes a plain
/// left-to-right drain, and the index arithmetic downstream depends on
/// this orientation.
#[derive(Debug, Clone)]
pub(crate) struct DenseSnapshot {
    pub timestamp: DateTime<Utc>,
    pub block_height: u32,
    pub weights: Array1<f64>,
}

impl DenseSnapshot {
    pub(crate) fn from_snapshot(snapshot: &MempoolSnapshot) -> Self {
        let mut weights = Array1::zeros(BUCKET_COUNT);

        for (&bucket, &weight) in &snapshot.bucketed_weights {
            // Sub-1 sat/vB rates map below bucket 0 and are dropped;
            // oversized indices collapse into the top bucket.
            if bucket >= 0 {
                weights[(BUCKET_MAX - bucket.min(BUCKET_MAX)) as usize] += weight as f64;
            }
        }

        Self {
            timestamp: snapshot.timestamp,
            block_height: snapshot.block_height,
            weights,
        }
    }

    #[cfg(test)]
    pub(crate) fn new(timestamp: DateTime<Utc>, block_height: u32, weights: Array1<f64>) -> Self {
        Self {
            timestamp,
            block_height,
            weights,
        }
    }
}
