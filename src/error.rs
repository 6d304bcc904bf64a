use thiserror::Error;

/// Errors reported by the estimation library.
///
/// Only misuse at the API boundary produces an error. Degenerate input
/// data (empty snapshot lists, zero observation spans, quiet mempools)
/// yields empty or partial tables instead.
#[derive(Error, Debug)]
pub enum EstimateError {
    /// The estimator configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A per-call argument is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EstimateError>;

impl EstimateError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}
