use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use tracing::debug;

use crate::engine::grid::EstimateGrid;
use crate::engine::histogram::DenseSnapshot;
use crate::engine::inflow;
use crate::error::{EstimateError, Result};
use crate::snapshot::MempoolSnapshot;
use crate::table::{Confidence, FeeTable, TargetEntry};

/// The entry point: turns a history of mempool snapshots into a table of
/// fee rates per confirmation target and confidence level.
///
/// Construction fixes the configuration; [`calculate`](Self::calculate)
/// is a pure function over its inputs, so one estimator can serve any
/// number of concurrent callers.
///
/// # Example
/// ```no_run
/// use fee_compass::{Estimator, MempoolSnapshot, MempoolTransaction};
/// use chrono::Utc;
///
/// let estimator = Estimator::new();
///
/// // Would normally cover the past 24 hours of snapshots.
/// let snapshots = vec![MempoolSnapshot::from_transactions(
///     &[MempoolTransaction::new(565, 1000)],
///     850_000,
///     Utc::now(),
/// )];
///
/// let table = estimator.calculate(&snapshots, None)?;
/// if let Some(rate) = table.fee_rate(6, 0.95) {
///     println!("6 blocks at 95%: {rate:.2} sat/vB");
/// }
/// # Ok::<(), fee_compass::EstimateError>(())
/// ```
pub struct Estimator {
    confidence_levels: Vec<f64>,
    block_targets: Vec<f64>,
    short_window: Duration,
    long_window: Duration,
    grid: EstimateGrid,
}

impl Estimator {
    /// Default confidence levels: 5%, 20%, 50%, 80%, 95%.
    pub const DEFAULT_CONFIDENCE_LEVELS: &'static [f64] = &[0.05, 0.20, 0.50, 0.80, 0.95];

    /// Default confirmation targets, in blocks.
    pub const DEFAULT_BLOCK_TARGETS: &'static [f64] = &[
        3.0, 6.0, 9.0, 12.0, 18.0, 24.0, 36.0, 48.0, 72.0, 96.0, 144.0,
    ];

    /// Smallest block target accepted for ad-hoc estimates; the
    /// simulation cannot model partial blocks below this.
    pub const MIN_CUSTOM_TARGET: f64 = 3.0;

    /// An estimator with the default configuration: the targets and
    /// confidence levels above, a 30-minute short window and a 24-hour
    /// long window.
    pub fn new() -> Self {
        Self::default()
    }

    /// An estimator with explicit configuration.
    ///
    /// Both lists must be non-empty, confidence levels must lie in
    /// `[0, 1]`, and targets must be strictly positive; anything else is
    /// an [`EstimateError::InvalidConfig`].
    pub fn with_config(
        confidence_levels: Vec<f64>,
        block_targets: Vec<f64>,
        short_window: Duration,
        long_window: Duration,
    ) -> Result<Self> {
        if confidence_levels.is_empty() {
            return Err(EstimateError::invalid_config(
                "at least one confidence level is required",
            ));
        }
        if block_targets.is_empty() {
            return Err(EstimateError::invalid_config(
                "at least one block target is required",
            ));
        }
        if confidence_levels.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(EstimateError::invalid_config(
                "confidence levels must lie within [0, 1]",
            ));
        }
        if block_targets.iter().any(|&t| t <= 0.0) {
            return Err(EstimateError::invalid_config(
                "block targets must be positive",
            ));
        }

        let grid = EstimateGrid::new(confidence_levels.clone(), block_targets.clone());

        Ok(Self {
            confidence_levels,
            block_targets,
            short_window,
            long_window,
            grid,
        })
    }

    /// Starts a builder seeded with this estimator's configuration, for
    /// deriving a new estimator with some fields replaced.
    ///
    /// ```
    /// use fee_compass::Estimator;
    /// use chrono::Duration;
    ///
    /// let tuned = Estimator::new()
    ///     .reconfigure()
    ///     .short_window(Duration::minutes(10))
    ///     .build()?;
    /// # let _ = tuned;
    /// # Ok::<(), fee_compass::EstimateError>(())
    /// ```
    pub fn reconfigure(&self) -> EstimatorBuilder {
        EstimatorBuilder {
            confidence_levels: self.confidence_levels.clone(),
            block_targets: self.block_targets.clone(),
            short_window: self.short_window,
            long_window: self.long_window,
        }
    }

    /// Calculates fee estimates from historical mempool snapshots.
    ///
    /// Snapshots may arrive in any order; ideally they cover the long
    /// window. With `custom_target` set (at least
    /// [`MIN_CUSTOM_TARGET`](Self::MIN_CUSTOM_TARGET)), the result holds
    /// that single target instead of the configured list.
    ///
    /// An empty snapshot list produces an empty table stamped with the
    /// current instant; otherwise the table carries the newest
    /// snapshot's timestamp.
    pub fn calculate(
        &self,
        snapshots: &[MempoolSnapshot],
        custom_target: Option<f64>,
    ) -> Result<FeeTable> {
        if let Some(target) = custom_target {
            if target < Self::MIN_CUSTOM_TARGET {
                return Err(EstimateError::invalid_parameter(
                    "custom block target must be at least 3",
                ));
            }
        }

        if snapshots.is_empty() {
            return Ok(FeeTable::empty(Utc::now()));
        }

        let mut dense: Vec<DenseSnapshot> =
            snapshots.iter().map(DenseSnapshot::from_snapshot).collect();
        dense.sort_by_key(|s| s.timestamp);
        let newest = dense.last().expect("snapshot list is non-empty here");

        debug!(
            snapshots = dense.len(),
            tip_height = newest.block_height,
            custom_target,
            "calculating fee estimates"
        );

        let short_inflow = inflow::expected_inflow(&dense, self.short_window);
        let long_inflow = inflow::expected_inflow(&dense, self.long_window);

        let targets: Vec<f64> = match custom_target {
            Some(target) => vec![target],
            None => self.block_targets.clone(),
        };
        // A custom target gets a freshly derived single-target grid; the
        // configured grid is precomputed once and reused.
        let custom_grid =
            custom_target.map(|t| EstimateGrid::new(self.confidence_levels.clone(), vec![t]));
        let grid = custom_grid.as_ref().unwrap_or(&self.grid);

        let rates = grid.fee_rates(&newest.weights, &short_inflow, &long_inflow);

        let mut entries = BTreeMap::new();
        for (i, &target) in targets.iter().enumerate() {
            let mut fee_rates = BTreeMap::new();
            for (j, &confidence) in self.confidence_levels.iter().enumerate() {
                if let Some(rate) = rates[[i, j]] {
                    fee_rates.insert(Confidence(confidence), rate);
                }
            }
            if !fee_rates.is_empty() {
                let blocks = target.round() as u32;
                entries.insert(blocks, TargetEntry::new(blocks, fee_rates));
            }
        }

        Ok(FeeTable::new(entries, newest.timestamp))
    }
}

impl Default for Estimator {
    fn default() -> Self {
        let confidence_levels = Self::DEFAULT_CONFIDENCE_LEVELS.to_vec();
        let block_targets = Self::DEFAULT_BLOCK_TARGETS.to_vec();
        let grid = EstimateGrid::new(confidence_levels.clone(), block_targets.clone());

        Self {
            confidence_levels,
            block_targets,
            short_window: Duration::minutes(30),
            long_window: Duration::hours(24),
            grid,
        }
    }
}

/// Builder returned by [`Estimator::reconfigure`]; fields not touched
/// keep their current values, and [`build`](Self::build) revalidates.
#[derive(Debug, Clone)]
pub struct EstimatorBuilder {
    confidence_levels: Vec<f64>,
    block_targets: Vec<f64>,
    short_window: Duration,
    long_window: Duration,
}

impl EstimatorBuilder {
    pub fn confidence_levels(mut self, levels: Vec<f64>) -> Self {
        self.confidence_levels = levels;
        self
    }

    pub fn block_targets(mut self, targets: Vec<f64>) -> Self {
        self.block_targets = targets;
        self
    }

    pub fn short_window(mut self, window: Duration) -> Self {
        self.short_window = window;
        self
    }

    pub fn long_window(mut self, window: Duration) -> Self {
        self.long_window = window;
        self
    }

    pub fn build(self) -> Result<Estimator> {
        Estimator::with_config(
            self.confidence_levels,
            self.block_targets,
            self.short_window,
            self.long_window,
        )
    }
}
