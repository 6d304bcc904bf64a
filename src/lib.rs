//! Bitcoin fee-rate forecasting from mempool history.
//!
//! Given a time series of mempool snapshots, the estimator simulates
//! block-by-block mining under a Poisson block-arrival model and reports,
//! for each confirmation target and confidence level, the fee rate in
//! sat/vB that would have been sufficient to get mined.
//!
//! # Overview
//! - Feed raw transactions into [`MempoolSnapshot::from_transactions`]
//!   as they are observed (typically every block and a few times in
//!   between).
//! - Hand the accumulated snapshots, ideally 24 hours' worth, to
//!   [`Estimator::calculate`].
//! - Read fee rates out of the returned [`FeeTable`].
//!
//! # Example
//! ```no_run
//! use fee_compass::{Estimator, MempoolSnapshot, MempoolTransaction};
//! use chrono::Utc;
//!
//! let estimator = Estimator::new();
//!
//! let snapshot = MempoolSnapshot::from_transactions(
//!     &[
//!         MempoolTransaction::new(565, 1000),
//!         MempoolTransaction::new(400, 800),
//!     ],
//!     850_000,
//!     Utc::now(),
//! );
//!
//! let table = estimator.calculate(&[snapshot], None).expect("valid input");
//! if let Some(rate) = table.fee_rate(6, 0.95) {
//!     println!("confirm within 6 blocks at 95%: {rate:.2} sat/vB");
//! }
//! println!("{table}");
//! ```
//!
//! The estimation itself is pure: no I/O, no shared state, no clocks
//! besides the timestamps carried by the snapshots. Collecting mempool
//! data and persisting snapshots belong to the caller.

mod engine;
mod error;
mod estimator;
mod snapshot;
mod table;
mod transaction;

pub use error::{EstimateError, Result};
pub use estimator::{Estimator, EstimatorBuilder};
pub use snapshot::MempoolSnapshot;
pub use table::{Confidence, FeeTable, TargetEntry};
pub use transaction::{MempoolTransaction, WU_PER_VBYTE};
