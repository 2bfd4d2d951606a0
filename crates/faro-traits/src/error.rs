//! Error types for the faro framework.
//!
//! Every failure in the decomposition, allocation and backtest stages is a
//! contract violation on the caller's input. None of them are retried: they
//! propagate to the caller with enough context to locate the bad step.

use crate::types::{Date, FactorId};
use thiserror::Error;

/// The main error type for faro operations.
#[derive(Debug, Error)]
pub enum FaroError {
    /// The estimation window is too small or contains non-finite values.
    #[error("Not enough data: {0}")]
    NotEnoughData(String),

    /// An operation that needs a fitted model was called before `fit`.
    #[error("Model not fitted: {0} requires a prior call to fit")]
    NotFitted(&'static str),

    /// The requested factor is not among the fitted loadings.
    #[error("Unknown factor {factor}: loadings only contain {available} factors")]
    UnknownFactor {
        /// The factor that was requested.
        factor: FactorId,
        /// Number of factors actually available.
        available: usize,
    },

    /// Fewer than two assets are shared by returns and loadings.
    #[error("Insufficient overlap: {common} common assets between returns and loadings, need at least 2")]
    InsufficientOverlap {
        /// Number of assets found in both inputs.
        common: usize,
    },

    /// The target factor's loading column sums to zero in absolute value.
    #[error("Degenerate weights: loading column of {0} has zero gross exposure")]
    DegenerateWeights(FactorId),

    /// The return series cannot produce a single evaluation point.
    #[error("Insufficient history: {rows} rows with window {window} yields no evaluation point")]
    InsufficientHistory {
        /// Number of rows in the return series.
        rows: usize,
        /// Configured window length.
        window: usize,
    },

    /// A configuration value is outside its allowed range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two inputs that must agree in length do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// A failure raised inside one walk-forward step.
    #[error("Step {index} ({date}) failed: {source}")]
    Step {
        /// Evaluation index `t` into the return series.
        index: usize,
        /// Date of the last row of the estimation window.
        date: Date,
        /// The underlying failure.
        #[source]
        source: Box<FaroError>,
    },
}

impl FaroError {
    /// Attach walk-forward step context to an error.
    pub fn at_step(self, index: usize, date: Date) -> Self {
        Self::Step {
            index,
            date,
            source: Box::new(self),
        }
    }

    /// Strip any step context and return the innermost error.
    pub fn root(&self) -> &Self {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A specialized Result type for faro operations.
///
/// This is a convenience type that uses [`FaroError`] as the error type.
pub type Result<T> = std::result::Result<T, FaroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FaroError::NotEnoughData("5 rows for 10 assets".to_string());
        assert_eq!(err.to_string(), "Not enough data: 5 rows for 10 assets");

        let err = FaroError::UnknownFactor {
            factor: FactorId::new(3),
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Unknown factor PC4: loadings only contain 3 factors"
        );
    }

    #[test]
    fn test_step_context_unwraps_to_root() {
        let date = Date::from_ymd_opt(2024, 3, 1).unwrap();
        let err = FaroError::DegenerateWeights(FactorId::SECOND).at_step(120, date);

        assert!(err.to_string().contains("Step 120 (2024-03-01)"));
        assert!(matches!(err.root(), FaroError::DegenerateWeights(_)));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(FaroError::NotFitted("transform"));
        assert!(err_result.is_err());
    }
}
