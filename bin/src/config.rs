//! Backtest configuration from a JSON file and command-line overrides.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use faro_eval::{BacktestConfig, CalibrationPolicy};
use faro_traits::FactorId;

/// Regime calibration selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Calibration {
    /// Full-sample quantile.
    Global,
    /// Quantile over volatilities observed so far.
    Trailing,
}

/// Backtest options shared by `run` and `simulate`.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct BacktestArgs {
    /// JSON file with a backtest configuration
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Rows per estimation window
    #[arg(short, long)]
    pub(crate) window: Option<usize>,

    /// Number of factors to keep
    #[arg(short = 'k', long)]
    pub(crate) components: Option<usize>,

    /// Target factor (e.g. PC2)
    #[arg(short, long)]
    pub(crate) target: Option<FactorId>,

    /// Weight multiplier in high-volatility regimes
    #[arg(long)]
    pub(crate) risk_scale: Option<f64>,

    /// Volatility quantile used as regime threshold
    #[arg(short, long)]
    pub(crate) quantile: Option<f64>,

    /// Regime threshold calibration
    #[arg(long, value_enum)]
    pub(crate) calibration: Option<Calibration>,

    /// Trailing calibration lookback (expanding if omitted)
    #[arg(long)]
    pub(crate) lookback: Option<usize>,

    /// Trailing calibration warm-up steps
    #[arg(long, default_value = "20")]
    pub(crate) min_periods: usize,

    /// Fit windows in parallel
    #[arg(long)]
    pub(crate) parallel: bool,
}

impl BacktestArgs {
    /// Load the config file, if any, then apply command-line overrides.
    pub(crate) fn resolve(&self) -> Result<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => BacktestConfig::default(),
        };

        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(components) = self.components {
            config.n_components = components;
        }
        if let Some(target) = self.target {
            config.target_factor = target;
        }
        if let Some(risk_scale) = self.risk_scale {
            config.risk_scale_high_vol = risk_scale;
        }
        if let Some(quantile) = self.quantile {
            config.vol_threshold_quantile = quantile;
        }
        match self.calibration {
            Some(Calibration::Global) => config.calibration = CalibrationPolicy::Global,
            Some(Calibration::Trailing) => {
                config.calibration = CalibrationPolicy::Trailing {
                    lookback: self.lookback,
                    min_periods: self.min_periods,
                }
            }
            None => {}
        }
        if self.parallel {
            config.parallel = true;
        }

        Ok(config)
    }
}
