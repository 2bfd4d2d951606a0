//! Performance metrics for a return series.
//!
//! Annualization uses arithmetic scaling: mean times periods per year, and
//! sample standard deviation times the square root of periods per year.

use faro_traits::stats;
use serde::{Deserialize, Serialize};

/// Trading days per year.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Summary statistics of a periodic return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean return times periods per year.
    pub annualized_return: f64,
    /// Sample standard deviation times the square root of periods per year.
    pub annualized_volatility: f64,
    /// Excess annualized return over annualized volatility.
    pub sharpe_ratio: f64,
    /// Worst peak-to-trough decline of compounded wealth, as a non-positive fraction.
    pub max_drawdown: f64,
    /// Compounded return over the whole series.
    pub total_return: f64,
    /// Number of returns.
    pub n_periods: usize,
}

impl PerformanceMetrics {
    /// Compute every metric for `returns`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use faro_eval::PerformanceMetrics;
    ///
    /// let metrics = PerformanceMetrics::from_returns(&[0.01, -0.005, 0.002], 0.0, 252);
    /// assert_eq!(metrics.n_periods, 3);
    /// assert!(metrics.max_drawdown <= 0.0);
    /// ```
    pub fn from_returns(returns: &[f64], risk_free_rate: f64, periods_per_year: usize) -> Self {
        let annualized_return = annualized_return(returns, periods_per_year);
        let annualized_volatility = annualized_volatility(returns, periods_per_year);
        Self {
            annualized_return,
            annualized_volatility,
            sharpe_ratio: sharpe_ratio(annualized_return, annualized_volatility, risk_free_rate),
            max_drawdown: max_drawdown(returns),
            total_return: total_return(returns),
            n_periods: returns.len(),
        }
    }
}

/// Mean periodic return times `periods_per_year`.
pub fn annualized_return(returns: &[f64], periods_per_year: usize) -> f64 {
    stats::mean(returns) * periods_per_year as f64
}

/// Sample standard deviation times `sqrt(periods_per_year)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: usize) -> f64 {
    stats::std_dev(returns, 1) * (periods_per_year as f64).sqrt()
}

/// `(annualized_return - risk_free_rate) / annualized_volatility`, NaN when
/// volatility is zero or undefined.
pub fn sharpe_ratio(annualized_return: f64, annualized_volatility: f64, risk_free_rate: f64) -> f64 {
    if annualized_volatility > 0.0 {
        (annualized_return - risk_free_rate) / annualized_volatility
    } else {
        f64::NAN
    }
}

/// Minimum of compounded wealth over its running maximum, minus one.
///
/// Returns 0 for an empty or never-declining series.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut wealth = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;

    for &r in returns {
        wealth *= 1.0 + r;
        peak = peak.max(wealth);
        worst = worst.min(wealth / peak - 1.0);
    }

    worst
}

/// Compounded return `prod(1 + r) - 1`.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}
