//! Portfolio weight containers.

use faro_traits::{Date, FaroError, Result, Symbol};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Per-asset allocation for one date.
///
/// Entries follow the asset order of the engine that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(Array1<f64>);

impl WeightVector {
    /// Wrap raw weights.
    pub const fn new(values: Array1<f64>) -> Self {
        Self(values)
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the weights.
    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.0.view()
    }

    /// Consume into the underlying array.
    pub fn into_inner(self) -> Array1<f64> {
        self.0
    }

    /// Sum of absolute weights.
    pub fn gross_exposure(&self) -> f64 {
        self.0.iter().map(|w| w.abs()).sum()
    }

    /// Sum of signed weights.
    pub fn net_exposure(&self) -> f64 {
        self.0.sum()
    }

    /// Every entry multiplied by `multiplier`.
    #[must_use]
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self(&self.0 * multiplier)
    }
}

impl AsRef<Array1<f64>> for WeightVector {
    fn as_ref(&self) -> &Array1<f64> {
        &self.0
    }
}

/// Weights for every row of an estimation window.
///
/// Rows are dates, columns are assets. Weights derived from one factor model
/// are constant across the window, so every row is identical.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    dates: Vec<Date>,
    assets: Vec<Symbol>,
    values: Array2<f64>,
}

impl WeightMatrix {
    /// Build a weight matrix.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DimensionMismatch`] if the shape disagrees with
    /// the dates or assets.
    pub fn new(dates: Vec<Date>, assets: Vec<Symbol>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != dates.len() {
            return Err(FaroError::DimensionMismatch {
                expected: dates.len(),
                actual: values.nrows(),
            });
        }
        if values.ncols() != assets.len() {
            return Err(FaroError::DimensionMismatch {
                expected: assets.len(),
                actual: values.ncols(),
            });
        }
        Ok(Self {
            dates,
            assets,
            values,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Asset names in column order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// The raw `dates x assets` matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// The weights of one row.
    pub fn row(&self, index: usize) -> Option<WeightVector> {
        (index < self.len()).then(|| WeightVector::new(self.values.row(index).to_owned()))
    }
}
