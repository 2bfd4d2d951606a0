//! Walk-forward backtesting for faro.
//!
//! This crate runs the rolling factor-model strategy end to end:
//! - Trailing-window refits of the factor model at every evaluation date
//! - Regime detection from the leading factor's volatility, with pluggable
//!   threshold calibration (full-sample or trailing quantile)
//! - Out-of-sample scoring of the target factor's eigen-portfolio
//! - Performance metrics and high-volatility span detection
//!
//! # Example
//!
//! ```rust,ignore
//! use faro_eval::{BacktestConfig, CalibrationPolicy, RollingRegimeBacktester};
//!
//! let config = BacktestConfig {
//!     window: 100,
//!     calibration: CalibrationPolicy::expanding(20),
//!     ..Default::default()
//! };
//! let result = RollingRegimeBacktester::new(config).run(&returns)?;
//! let metrics = result.performance(0.0, 252);
//! println!("Sharpe Ratio: {:.2}", metrics.sharpe_ratio);
//! ```

pub mod backtest;
pub mod config;
pub mod metrics;
pub mod regime;
pub mod result;

// Re-export main types
pub use backtest::RollingRegimeBacktester;
pub use config::BacktestConfig;
pub use metrics::{PerformanceMetrics, TRADING_DAYS_PER_YEAR};
pub use regime::{CalibrationPolicy, RegimeCalibrator};
pub use result::{BacktestRecord, BacktestResult, RegimeSpan};
