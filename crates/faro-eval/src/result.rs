//! Backtest output.

use faro_portfolio::WeightVector;
use faro_traits::{Date, Result, Symbol};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

/// One out-of-sample evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    /// Date of the scored return, the row right after the estimation window.
    pub date: Date,
    /// Weights applied on `date`, after any regime scaling.
    pub weights: WeightVector,
    /// Realized portfolio return on `date`.
    pub portfolio_return: f64,
    /// Leading-factor volatility over the estimation window.
    pub leading_factor_vol: f64,
    /// Regime threshold in force for this step.
    pub threshold: f64,
    /// Whether `leading_factor_vol` exceeded `threshold`.
    pub high_vol: bool,
}

/// A contiguous run of high-volatility evaluation dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeSpan {
    /// First high-volatility date.
    pub start: Date,
    /// Last high-volatility date, inclusive.
    pub end: Date,
    /// Number of evaluation dates in the span.
    pub len: usize,
}

/// Aligned output of a walk-forward run.
///
/// Every series is indexed by the same evaluation dates, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    assets: Vec<Symbol>,
    records: Vec<BacktestRecord>,
    regime_threshold: f64,
}

impl BacktestResult {
    /// Assemble a result from records produced in date order.
    pub const fn new(assets: Vec<Symbol>, records: Vec<BacktestRecord>, regime_threshold: f64) -> Self {
        Self {
            assets,
            records,
            regime_threshold,
        }
    }

    /// Number of evaluation points.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no evaluation points.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-step records.
    pub fn records(&self) -> &[BacktestRecord] {
        &self.records
    }

    /// Asset names, matching the order of every weight vector.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// Evaluation dates.
    pub fn dates(&self) -> Vec<Date> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Out-of-sample portfolio returns.
    pub fn portfolio_returns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.portfolio_return).collect()
    }

    /// Weight history, `dates x assets`.
    pub fn weight_history(&self) -> Array2<f64> {
        let n_assets = self.assets.len();
        Array2::from_shape_fn((self.records.len(), n_assets), |(i, j)| {
            self.records[i].weights.view()[j]
        })
    }

    /// Leading-factor volatility per evaluation date.
    pub fn leading_factor_vol(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.leading_factor_vol).collect()
    }

    /// Threshold in force on the last scored date.
    ///
    /// Under global calibration this is the single threshold applied at
    /// every step.
    pub const fn regime_threshold(&self) -> f64 {
        self.regime_threshold
    }

    /// Number of high-volatility evaluation dates.
    pub fn high_vol_count(&self) -> usize {
        self.records.iter().filter(|r| r.high_vol).count()
    }

    /// Contiguous high-volatility spans, in date order.
    pub fn high_vol_spans(&self) -> Vec<RegimeSpan> {
        let mut spans = Vec::new();
        let mut current: Option<RegimeSpan> = None;

        for record in &self.records {
            if !record.high_vol {
                spans.extend(current.take());
            } else if let Some(span) = current.as_mut() {
                span.end = record.date;
                span.len += 1;
            } else {
                current = Some(RegimeSpan {
                    start: record.date,
                    end: record.date,
                    len: 1,
                });
            }
        }
        spans.extend(current);
        spans
    }

    /// Performance summary of the out-of-sample returns.
    pub fn performance(&self, risk_free_rate: f64, periods_per_year: usize) -> PerformanceMetrics {
        PerformanceMetrics::from_returns(&self.portfolio_returns(), risk_free_rate, periods_per_year)
    }

    /// The result as a polars frame.
    ///
    /// Columns: `date`, `return`, `leading_factor_vol`, `threshold`,
    /// `high_vol`, then one weight column per asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be built.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Column::new("date".into(), self.dates()),
            Column::new("return".into(), self.portfolio_returns()),
            Column::new("leading_factor_vol".into(), self.leading_factor_vol()),
            Column::new(
                "threshold".into(),
                self.records.iter().map(|r| r.threshold).collect::<Vec<_>>(),
            ),
            Column::new(
                "high_vol".into(),
                self.records.iter().map(|r| r.high_vol).collect::<Vec<_>>(),
            ),
        ];

        let weights = self.weight_history();
        for (asset, column) in self.assets.iter().zip(weights.columns()) {
            columns.push(Column::new(asset.as_str().into(), column.to_vec()));
        }

        Ok(DataFrame::new(columns)?)
    }
}
