//! Backtest configuration.

use faro_traits::{FactorId, FaroError, Result};
use serde::{Deserialize, Serialize};

use crate::regime::CalibrationPolicy;

/// Configuration for [`RollingRegimeBacktester`](crate::RollingRegimeBacktester).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Rows per estimation window.
    pub window: usize,
    /// Number of factors kept by each fit.
    pub n_components: usize,
    /// Factor whose loadings define the portfolio.
    pub target_factor: FactorId,
    /// Weight multiplier applied in high-volatility regimes.
    pub risk_scale_high_vol: f64,
    /// Quantile of leading-factor volatility used as the regime threshold.
    pub vol_threshold_quantile: f64,
    /// How the regime threshold is calibrated.
    pub calibration: CalibrationPolicy,
    /// Fit windows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window: 252,
            n_components: 3,
            target_factor: FactorId::SECOND,
            risk_scale_high_vol: 0.5,
            vol_threshold_quantile: 0.75,
            calibration: CalibrationPolicy::Global,
            parallel: false,
        }
    }
}

impl BacktestConfig {
    /// Check the configuration against a universe of `n_assets` assets.
    ///
    /// # Errors
    ///
    /// - [`FaroError::NotEnoughData`] if `window <= n_assets`.
    /// - [`FaroError::InvalidConfig`] for any other value out of range.
    pub fn validate(&self, n_assets: usize) -> Result<()> {
        if self.window <= n_assets {
            return Err(FaroError::NotEnoughData(format!(
                "window of {} rows must exceed the {} assets",
                self.window, n_assets
            )));
        }
        if self.n_components < 2 {
            return Err(FaroError::InvalidConfig(format!(
                "n_components must be at least 2, got {}",
                self.n_components
            )));
        }
        if self.n_components > n_assets {
            return Err(FaroError::InvalidConfig(format!(
                "n_components {} exceeds the {} assets",
                self.n_components, n_assets
            )));
        }
        if self.target_factor.rank() >= self.n_components {
            return Err(FaroError::InvalidConfig(format!(
                "target factor {} is not among the {} kept factors",
                self.target_factor, self.n_components
            )));
        }
        if !(self.risk_scale_high_vol > 0.0 && self.risk_scale_high_vol <= 1.0) {
            return Err(FaroError::InvalidConfig(format!(
                "risk_scale_high_vol must be in (0, 1], got {}",
                self.risk_scale_high_vol
            )));
        }
        if !(0.0..=1.0).contains(&self.vol_threshold_quantile) {
            return Err(FaroError::InvalidConfig(format!(
                "vol_threshold_quantile must be in [0, 1], got {}",
                self.vol_threshold_quantile
            )));
        }
        self.calibration.validate()
    }
}
