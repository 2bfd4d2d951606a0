//! Factor-targeted allocation.
//!
//! Turns one factor's loading column into a long/short portfolio. The
//! leading factor is usually the market, so targeting a lower-ranked factor
//! (the second by default) produces an approximately market-neutral
//! eigen-portfolio.

use faro_traits::{Date, FactorId, FaroError, Loadings, Result, ReturnWindow, Symbol};
use ndarray::{Array1, Array2, ArrayView1};

use crate::weights::{WeightMatrix, WeightVector};

/// Builds and scores portfolios from one factor's loadings.
///
/// On construction the returns and loadings are intersected on their common
/// assets, keeping the order of the returns.
///
/// # Example
///
/// ```rust,ignore
/// use faro_portfolio::AllocationEngine;
/// use faro_traits::FactorId;
///
/// let engine = AllocationEngine::new(&window, model.loadings(), FactorId::SECOND)?;
/// let weights = engine.evaluation_weights()?;
/// let pnl = AllocationEngine::score(&weights, returns.row(t + 1).unwrap())?;
/// ```
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    target: FactorId,
    dates: Vec<Date>,
    assets: Vec<Symbol>,
    returns: Array2<f64>,
    exposure: Array1<f64>,
}

impl AllocationEngine {
    /// Create an engine for `target` over the assets shared by both inputs.
    ///
    /// # Errors
    ///
    /// - [`FaroError::UnknownFactor`] if `target` is not a loading column.
    /// - [`FaroError::InsufficientOverlap`] if fewer than two assets are common.
    pub fn new(returns: &ReturnWindow<'_>, loadings: &Loadings, target: FactorId) -> Result<Self> {
        let column = loadings.column(target)?;

        let mut columns = Vec::new();
        let mut assets = Vec::new();
        let mut exposure = Vec::new();
        for (j, asset) in returns.assets().iter().enumerate() {
            if let Some(row) = loadings.asset_index(asset) {
                columns.push(j);
                assets.push(asset.clone());
                exposure.push(column[row]);
            }
        }

        if assets.len() < 2 {
            return Err(FaroError::InsufficientOverlap {
                common: assets.len(),
            });
        }

        let values = returns.values();
        let aligned = Array2::from_shape_fn((values.nrows(), columns.len()), |(i, k)| {
            values[[i, columns[k]]]
        });

        Ok(Self {
            target,
            dates: returns.dates().to_vec(),
            assets,
            returns: aligned,
            exposure: Array1::from_vec(exposure),
        })
    }

    /// The targeted factor.
    pub const fn target(&self) -> FactorId {
        self.target
    }

    /// Common assets, in return-column order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// The target factor's exposure divided by its gross exposure.
    fn normalized_exposure(&self) -> Result<Array1<f64>> {
        let gross: f64 = self.exposure.iter().map(|l| l.abs()).sum();
        if gross == 0.0 || !gross.is_finite() {
            return Err(FaroError::DegenerateWeights(self.target));
        }
        Ok(&self.exposure / gross)
    }

    /// Weights for every row of the window.
    ///
    /// The target loading column is divided by the sum of its absolute
    /// values, so each row's gross exposure is one, and replicated across
    /// all dates of the window.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DegenerateWeights`] if the loading column is all zero.
    pub fn build_weights(&self) -> Result<WeightMatrix> {
        let row = self.normalized_exposure()?;
        let values = Array2::from_shape_fn((self.dates.len(), row.len()), |(_, j)| row[j]);
        WeightMatrix::new(self.dates.clone(), self.assets.clone(), values)
    }

    /// The weights applied on the evaluation date.
    ///
    /// Identical to the first row of [`build_weights`](Self::build_weights),
    /// without materializing the whole matrix.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DegenerateWeights`] if the loading column is all zero.
    pub fn evaluation_weights(&self) -> Result<WeightVector> {
        self.normalized_exposure().map(WeightVector::new)
    }

    /// Portfolio return of `weights` against one return vector.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DimensionMismatch`] if the lengths differ.
    pub fn score(weights: &WeightVector, returns: ArrayView1<'_, f64>) -> Result<f64> {
        if weights.len() != returns.len() {
            return Err(FaroError::DimensionMismatch {
                expected: weights.len(),
                actual: returns.len(),
            });
        }
        Ok(weights.view().dot(&returns))
    }

    /// In-window portfolio returns, one per row.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DimensionMismatch`] if `weights` does not match
    /// the window's shape.
    pub fn portfolio_returns(&self, weights: &WeightMatrix) -> Result<Array1<f64>> {
        if weights.values().dim() != self.returns.dim() {
            return Err(FaroError::DimensionMismatch {
                expected: self.returns.len(),
                actual: weights.values().len(),
            });
        }
        Ok((weights.values() * &self.returns).sum_axis(ndarray::Axis(1)))
    }
}
