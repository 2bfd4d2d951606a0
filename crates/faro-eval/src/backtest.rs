//! Walk-forward backtest with regime-adaptive risk scaling.
//!
//! For every evaluation index `t` a factor model is fitted on the trailing
//! `window` rows `[t - window, t)`. The target factor's loadings become the
//! portfolio, which is scored against row `t + 1`. When the leading factor's
//! volatility over the window exceeds the calibrated threshold, the weights
//! are scaled down by `risk_scale_high_vol`.
//!
//! The run has two passes. Pass 1 fits every window in `[window, len)` and
//! collects leading-factor volatilities, from which the regime thresholds are
//! calibrated. Pass 2 walks `[window, len - 1)`, applies the thresholds and
//! scores each step. Pass-1 fits are reused by Pass 2.

use faro_pca::FactorModel;
use faro_portfolio::{AllocationEngine, WeightVector};
use faro_traits::{FactorId, FaroError, Result, ReturnMatrix};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::BacktestConfig;
use crate::regime::RegimeCalibrator;
use crate::result::{BacktestRecord, BacktestResult};

/// Per-window output of Pass 1.
#[derive(Debug, Clone)]
struct StepFit {
    /// Sample standard deviation of the leading factor's projected series.
    leading_factor_vol: f64,
    /// Unscaled evaluation weights; absent for the final index, which is
    /// only used for calibration.
    weights: Option<WeightVector>,
}

/// Rolling walk-forward backtester.
///
/// # Example
///
/// ```rust,ignore
/// use faro_eval::{BacktestConfig, RollingRegimeBacktester};
///
/// let config = BacktestConfig { window: 100, ..Default::default() };
/// let result = RollingRegimeBacktester::new(config).run(&returns)?;
/// println!("{} points, threshold {:.4}", result.len(), result.regime_threshold());
/// ```
#[derive(Debug)]
pub struct RollingRegimeBacktester {
    config: BacktestConfig,
    calibrator: Box<dyn RegimeCalibrator>,
}

impl Default for RollingRegimeBacktester {
    fn default() -> Self {
        Self::new(BacktestConfig::default())
    }
}

impl RollingRegimeBacktester {
    /// Create a backtester calibrating with `config.calibration`.
    pub fn new(config: BacktestConfig) -> Self {
        let calibrator: Box<dyn RegimeCalibrator> = Box::new(config.calibration);
        Self { config, calibrator }
    }

    /// Replace the regime calibrator.
    #[must_use]
    pub fn with_calibrator(mut self, calibrator: impl RegimeCalibrator + 'static) -> Self {
        self.calibrator = Box::new(calibrator);
        self
    }

    /// The configuration.
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Number of evaluation points a series of `rows` rows produces.
    pub const fn evaluation_points(&self, rows: usize) -> usize {
        rows.saturating_sub(self.config.window).saturating_sub(1)
    }

    /// Run the two-pass walk-forward backtest.
    ///
    /// # Errors
    ///
    /// - [`FaroError::NotEnoughData`] or [`FaroError::InvalidConfig`] if the
    ///   configuration does not fit the universe.
    /// - [`FaroError::InsufficientHistory`] if no evaluation point exists.
    /// - [`FaroError::DimensionMismatch`] if the calibrator does not return
    ///   one threshold per fitted window.
    /// - [`FaroError::Step`] wrapping the first failure inside a step; the
    ///   run is aborted.
    pub fn run(&self, returns: &ReturnMatrix) -> Result<BacktestResult> {
        let n = returns.len();
        let window = self.config.window;

        self.config.validate(returns.n_assets())?;
        if self.evaluation_points(n) == 0 {
            return Err(FaroError::InsufficientHistory { rows: n, window });
        }

        info!(
            rows = n,
            assets = returns.n_assets(),
            window,
            n_components = self.config.n_components,
            target = %self.config.target_factor,
            calibration = self.calibrator.name(),
            parallel = self.config.parallel,
            "Starting walk-forward backtest"
        );

        let fits = self.calibration_pass(returns)?;

        let vols: Vec<f64> = fits.iter().map(|f| f.leading_factor_vol).collect();
        let thresholds = self
            .calibrator
            .thresholds(&vols, self.config.vol_threshold_quantile)?;
        if thresholds.len() != fits.len() {
            return Err(FaroError::DimensionMismatch {
                expected: fits.len(),
                actual: thresholds.len(),
            });
        }

        let records = self.allocation_pass(returns, &fits, &thresholds)?;

        // The final fit only feeds calibration; report the last scored step.
        let regime_threshold = records.last().map_or(f64::NAN, |r| r.threshold);
        info!(
            threshold = regime_threshold,
            quantile = self.config.vol_threshold_quantile,
            "Calibrated regime threshold"
        );

        let result = BacktestResult::new(returns.assets().to_vec(), records, regime_threshold);
        info!(
            points = result.len(),
            high_vol = result.high_vol_count(),
            "Backtest finished"
        );
        Ok(result)
    }

    /// Pass 1: fit every window in `[window, len)`.
    fn calibration_pass(&self, returns: &ReturnMatrix) -> Result<Vec<StepFit>> {
        let steps = self.config.window..returns.len();
        if self.config.parallel {
            steps
                .into_par_iter()
                .map(|t| self.fit_step(returns, t))
                .collect()
        } else {
            steps.map(|t| self.fit_step(returns, t)).collect()
        }
    }

    /// Fit the window ending before `t`.
    ///
    /// Only rows `[t - window, t)` are read.
    fn fit_step(&self, returns: &ReturnMatrix, t: usize) -> Result<StepFit> {
        let window = returns.window(t - self.config.window..t)?;
        let in_step = |e: FaroError| match window.last_date() {
            Some(date) => e.at_step(t, date),
            None => e,
        };

        let model = FactorModel::fit(&window, self.config.n_components).map_err(in_step)?;
        let factors = model.transform(&window).map_err(in_step)?;
        let leading_factor_vol = factors.std(FactorId::LEADING).map_err(in_step)?;

        let weights = if t + 1 < returns.len() {
            let engine = AllocationEngine::new(&window, model.loadings(), self.config.target_factor)
                .map_err(in_step)?;
            Some(engine.evaluation_weights().map_err(in_step)?)
        } else {
            None
        };

        Ok(StepFit {
            leading_factor_vol,
            weights,
        })
    }

    /// Pass 2: scale and score every `t` in `[window, len - 1)`.
    fn allocation_pass(
        &self,
        returns: &ReturnMatrix,
        fits: &[StepFit],
        thresholds: &[f64],
    ) -> Result<Vec<BacktestRecord>> {
        let window = self.config.window;
        let dates = returns.dates();
        let mut records = Vec::with_capacity(self.evaluation_points(returns.len()));

        for t in window..returns.len() - 1 {
            let step = t - window;
            let fit = &fits[step];
            let threshold = thresholds[step];
            let step_err = |e: FaroError| e.at_step(t, dates[t - 1]);

            let unscaled = fit.weights.as_ref().ok_or_else(|| {
                step_err(FaroError::InvalidData(
                    "missing evaluation weights".to_string(),
                ))
            })?;

            let high_vol = fit.leading_factor_vol > threshold;
            let weights = if high_vol {
                unscaled.scaled(self.config.risk_scale_high_vol)
            } else {
                unscaled.clone()
            };

            let next = returns.row(t + 1).ok_or_else(|| {
                step_err(FaroError::DimensionMismatch {
                    expected: t + 2,
                    actual: returns.len(),
                })
            })?;
            let portfolio_return = AllocationEngine::score(&weights, next).map_err(step_err)?;

            debug!(
                t,
                date = %dates[t + 1],
                vol = fit.leading_factor_vol,
                threshold,
                high_vol,
                portfolio_return,
                "Scored step"
            );

            records.push(BacktestRecord {
                date: dates[t + 1],
                weights,
                portfolio_return,
                leading_factor_vol: fit.leading_factor_vol,
                threshold,
                high_vol,
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::CalibrationPolicy;
    use faro_traits::Date;
    use ndarray::Array2;

    fn returns(n_obs: usize, n_assets: usize) -> ReturnMatrix {
        let start = Date::from_ymd_opt(2023, 1, 2).unwrap();
        let dates = (0..n_obs)
            .map(|t| start + chrono::Duration::days(t as i64))
            .collect();
        let assets = (0..n_assets).map(|i| format!("A{i}")).collect();
        let values = Array2::from_shape_fn((n_obs, n_assets), |(t, i)| {
            let market = (t as f64 * 0.731).sin() * 0.02;
            let spread = (t as f64 * 1.913 + 0.4).cos() * 0.01;
            let noise = ((t * 31 + i * 17) as f64 * 12.9898).sin() * 0.004;
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            (0.8 + 0.05 * i as f64) * market + side * spread + noise
        });
        ReturnMatrix::new(dates, assets, values).unwrap()
    }

    fn config(window: usize) -> BacktestConfig {
        BacktestConfig {
            window,
            ..Default::default()
        }
    }

    #[test]
    fn test_evaluation_points() {
        let backtester = RollingRegimeBacktester::new(config(20));
        assert_eq!(backtester.evaluation_points(30), 9);
        assert_eq!(backtester.evaluation_points(21), 0);
        assert_eq!(backtester.evaluation_points(5), 0);
    }

    #[test]
    fn test_run_produces_aligned_records() {
        let data = returns(40, 4);
        let result = RollingRegimeBacktester::new(config(20)).run(&data).unwrap();

        assert_eq!(result.len(), 40 - 20 - 1);
        assert_eq!(result.dates(), data.dates()[21..].to_vec());
        assert_eq!(result.assets(), data.assets());
    }

    #[test]
    fn test_insufficient_history() {
        let data = returns(21, 4);
        let result = RollingRegimeBacktester::new(config(20)).run(&data);
        assert!(matches!(
            result,
            Err(FaroError::InsufficientHistory {
                rows: 21,
                window: 20
            })
        ));
    }

    #[test]
    fn test_window_not_exceeding_assets() {
        let data = returns(40, 6);
        let result = RollingRegimeBacktester::new(config(6)).run(&data);
        assert!(matches!(result, Err(FaroError::NotEnoughData(_))));
    }

    #[test]
    fn test_custom_calibrator() {
        #[derive(Debug)]
        struct NeverHigh;

        impl RegimeCalibrator for NeverHigh {
            fn name(&self) -> &str {
                "never"
            }

            fn thresholds(&self, vols: &[f64], _q: f64) -> Result<Vec<f64>> {
                Ok(vec![f64::INFINITY; vols.len()])
            }
        }

        let data = returns(40, 4);
        let result = RollingRegimeBacktester::new(config(20))
            .with_calibrator(NeverHigh)
            .run(&data)
            .unwrap();
        assert_eq!(result.high_vol_count(), 0);
        assert!(result.high_vol_spans().is_empty());
    }

    #[test]
    fn test_short_calibrator_output_is_rejected() {
        #[derive(Debug)]
        struct HalfLength;

        impl RegimeCalibrator for HalfLength {
            fn name(&self) -> &str {
                "half"
            }

            fn thresholds(&self, vols: &[f64], _q: f64) -> Result<Vec<f64>> {
                Ok(vec![1.0; vols.len() / 2])
            }
        }

        let data = returns(120, 5);
        let result = RollingRegimeBacktester::new(config(40))
            .with_calibrator(HalfLength)
            .run(&data);
        assert!(matches!(
            result,
            Err(FaroError::DimensionMismatch {
                expected: 80,
                actual: 40
            })
        ));
    }

    #[test]
    fn test_reported_threshold_is_last_scored_step() {
        let data = returns(60, 4);
        let backtester = RollingRegimeBacktester::new(BacktestConfig {
            calibration: CalibrationPolicy::expanding(5),
            ..config(20)
        });
        let result = backtester.run(&data).unwrap();

        let last = result.records().last().unwrap();
        assert_eq!(result.regime_threshold(), last.threshold);
    }

    #[test]
    fn test_evaluation_points_does_not_overflow() {
        let backtester = RollingRegimeBacktester::new(config(usize::MAX));
        assert_eq!(backtester.evaluation_points(500), 0);
        assert_eq!(backtester.evaluation_points(usize::MAX), 0);
    }

    #[test]
    fn test_step_failure_carries_context() {
        let data = Array2::zeros((40, 4));
        let start = Date::from_ymd_opt(2023, 1, 2).unwrap();
        let dates = (0..40)
            .map(|t| start + chrono::Duration::days(t as i64))
            .collect();
        let assets = (0..4).map(|i| format!("A{i}")).collect();
        let flat = ReturnMatrix::new(dates, assets, data).unwrap();

        let err = RollingRegimeBacktester::new(config(20)).run(&flat).unwrap_err();
        assert!(matches!(err, FaroError::Step { index: 20, .. }));
        assert!(matches!(err.root(), FaroError::NotEnoughData(_)));
    }
}
