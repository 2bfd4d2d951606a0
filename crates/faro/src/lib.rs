#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/faro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # faro
//!
//! faro is an umbrella crate that re-exports all faro sub-crates for
//! convenience.
//!
//! ## Crate Organization
//!
//! - [`traits`] - Shared types, errors and statistics
//! - [`pca`] - Factor decomposition and diagnostics
//! - [`portfolio`] - Factor-targeted allocation
//! - [`eval`] - Walk-forward backtest, regime calibration and metrics
//! - [`data`] - Price ingestion, log returns and synthetic data
//!
//! ## Pipeline
//!
//! 1. **Data** loads aligned prices and converts them into a [`ReturnMatrix`]
//! 2. **Decomposition** fits a factor model on each trailing window
//! 3. **Allocation** turns the target factor's loadings into weights
//! 4. **Evaluation** scales weights by regime and scores them out of sample

/// Version information for the faro crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared types, the error taxonomy and statistics helpers.
pub mod traits {
    pub use faro_traits::*;
}

/// Factor decomposition.
///
/// Standardizes each window, eigendecomposes its correlation matrix and
/// exposes loadings, explained variance, projection, reconstruction and
/// diagnostics.
pub mod pca {
    pub use faro_pca::*;
}

/// Factor-targeted allocation.
pub mod portfolio {
    pub use faro_portfolio::*;
}

/// Walk-forward backtesting.
///
/// ## Regime threshold
///
/// Leading-factor volatility at each step is compared with a quantile of
/// the volatility series:
///
/// ```text
/// high_vol_t = vol_t > quantile(vols, q)
/// ```
///
/// With [`CalibrationPolicy::Global`](faro_eval::CalibrationPolicy::Global)
/// the quantile is taken over the whole run, so the threshold uses future
/// volatility. The trailing policy only uses volatilities up to `t`.
pub mod eval {
    pub use faro_eval::*;
}

/// Price ingestion and synthetic returns.
pub mod data {
    pub use faro_data::*;
}

// Re-export error types
pub use faro_traits::{FaroError, Result};

// Re-export common types
pub use faro_traits::{Date, FactorId, Loadings, ReturnMatrix, ReturnWindow, Symbol};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use faro::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Date, FactorId, FaroError, ReturnMatrix, Result, Symbol};
    pub use faro_data::{PriceLoader, SyntheticReturns, compute_log_returns};
    pub use faro_eval::{
        BacktestConfig, BacktestResult, CalibrationPolicy, PerformanceMetrics,
        RollingRegimeBacktester,
    };
    pub use faro_pca::{FactorDecomposer, FactorModel};
    pub use faro_portfolio::{AllocationEngine, WeightVector};
}
