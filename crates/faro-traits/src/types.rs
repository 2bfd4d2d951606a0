//! Common types used throughout the faro framework.
//!
//! This module defines the return series every stage reads, the borrowed
//! estimation windows cut from it, and the rank-based factor identifiers.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Slice};
use serde::{Deserialize, Serialize};

use crate::error::{FaroError, Result};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// An asset identifier, typically a ticker such as `"XLK"`.
pub type Symbol = String;

/// Identifier of a ranked factor.
///
/// Factors are selected by rank (0 = the factor explaining the most
/// variance), never by a free-form label. The label `PC{rank + 1}` is only a
/// stable presentation of the rank and round-trips through [`FromStr`].
///
/// # Example
///
/// ```
/// use faro_traits::FactorId;
///
/// let target: FactorId = "PC2".parse().unwrap();
/// assert_eq!(target, FactorId::SECOND);
/// assert_eq!(target.rank(), 1);
/// assert_eq!(target.to_string(), "PC2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FactorId(usize);

impl FactorId {
    /// The leading factor.
    pub const LEADING: Self = Self(0);

    /// The second-ranked factor, the default allocation target.
    pub const SECOND: Self = Self(1);

    /// Create an identifier from a zero-based rank.
    pub const fn new(rank: usize) -> Self {
        Self(rank)
    }

    /// Zero-based rank of the factor.
    pub const fn rank(self) -> usize {
        self.0
    }

    /// Identifiers for the first `n` factors, in rank order.
    pub fn first(n: usize) -> Vec<Self> {
        (0..n).map(Self).collect()
    }
}

impl Default for FactorId {
    fn default() -> Self {
        Self::SECOND
    }
}

impl fmt::Display for FactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PC{}", self.0 + 1)
    }
}

impl FromStr for FactorId {
    type Err = FaroError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("PC")
            .or_else(|| trimmed.strip_prefix("pc"))
            .unwrap_or(trimmed);

        match digits.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Self(n - 1)),
            _ => Err(FaroError::InvalidConfig(format!(
                "invalid factor identifier '{s}', expected PC1, PC2, ..."
            ))),
        }
    }
}

impl TryFrom<String> for FactorId {
    type Error = FaroError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FactorId> for String {
    fn from(id: FactorId) -> Self {
        id.to_string()
    }
}

/// A fully materialized series of per-asset log-returns.
///
/// Rows are dates, columns are assets. Construction enforces the invariants
/// every downstream stage relies on: strictly increasing dates, one finite
/// value per asset per row and a fixed, duplicate-free asset ordering. The
/// matrix is read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<Date>,
    assets: Vec<Symbol>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Build a return matrix, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DimensionMismatch`] if the shape disagrees with
    /// the number of dates or assets, and [`FaroError::InvalidData`] for
    /// unsorted or duplicated dates, duplicated assets or non-finite values.
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
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(FaroError::InvalidData(format!(
                "dates must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }
        for (i, asset) in assets.iter().enumerate() {
            if assets[..i].contains(asset) {
                return Err(FaroError::InvalidData(format!("duplicate asset '{asset}'")));
            }
        }
        if let Some(((row, col), _)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(FaroError::InvalidData(format!(
                "non-finite return for {} on {}",
                assets[col], dates[row]
            )));
        }

        Ok(Self {
            dates,
            assets,
            values,
        })
    }

    /// Number of dates (rows).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of assets (columns).
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Row dates in order.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Asset names in column order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// The raw `dates x assets` value matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// The return vector for one date.
    pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.len()).then(|| self.values.row(index))
    }

    /// Borrow the contiguous rows `range` as an estimation window.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::InvalidData`] if the range falls outside the series.
    pub fn window(&self, range: Range<usize>) -> Result<ReturnWindow<'_>> {
        if range.start > range.end || range.end > self.len() {
            return Err(FaroError::InvalidData(format!(
                "window {}..{} out of bounds for {} rows",
                range.start,
                range.end,
                self.len()
            )));
        }

        Ok(ReturnWindow {
            dates: &self.dates[range.clone()],
            assets: &self.assets,
            values: self.values.slice_axis(Axis(0), Slice::from(range)),
        })
    }
}

/// A borrowed, contiguous slice of returns used to estimate one factor model.
///
/// Windows cut from a [`ReturnMatrix`] inherit its invariants. Windows built
/// directly through [`ReturnWindow::new`] only have their shape checked, so
/// consumers still validate the values they need.
#[derive(Debug, Clone, Copy)]
pub struct ReturnWindow<'a> {
    dates: &'a [Date],
    assets: &'a [Symbol],
    values: ArrayView2<'a, f64>,
}

impl<'a> ReturnWindow<'a> {
    /// Wrap borrowed data as a window.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DimensionMismatch`] if the shape disagrees with
    /// the dates or assets.
    pub fn new(dates: &'a [Date], assets: &'a [Symbol], values: ArrayView2<'a, f64>) -> Result<Self> {
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

    /// Number of rows in the window.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the window has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Row dates in order.
    pub const fn dates(&self) -> &'a [Date] {
        self.dates
    }

    /// Asset names in column order.
    pub const fn assets(&self) -> &'a [Symbol] {
        self.assets
    }

    /// The `rows x assets` values.
    pub const fn values(&self) -> ArrayView2<'a, f64> {
        self.values
    }

    /// Date of the last row, if any.
    pub fn last_date(&self) -> Option<Date> {
        self.dates.last().copied()
    }
}

/// Per-asset factor loadings ("eigen-portfolios").
///
/// An `assets x factors` matrix whose columns are the factor directions in
/// asset space. Columns are keyed by [`FactorId`], rows by asset name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadings {
    assets: Vec<Symbol>,
    factors: Vec<FactorId>,
    values: Array2<f64>,
}

impl Loadings {
    /// Build a loading matrix.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::DimensionMismatch`] if the shape disagrees with
    /// the asset or factor labels.
    pub fn new(assets: Vec<Symbol>, factors: Vec<FactorId>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != assets.len() {
            return Err(FaroError::DimensionMismatch {
                expected: assets.len(),
                actual: values.nrows(),
            });
        }
        if values.ncols() != factors.len() {
            return Err(FaroError::DimensionMismatch {
                expected: factors.len(),
                actual: values.ncols(),
            });
        }
        Ok(Self {
            assets,
            factors,
            values,
        })
    }

    /// Asset names in row order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// Factor identifiers in column order.
    pub fn factors(&self) -> &[FactorId] {
        &self.factors
    }

    /// The raw `assets x factors` matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Number of factors.
    pub fn n_factors(&self) -> usize {
        self.factors.len()
    }

    /// Row of `symbol`, if present.
    pub fn asset_index(&self, symbol: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == symbol)
    }

    /// The loading column of one factor.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::UnknownFactor`] if `factor` is not a column.
    pub fn column(&self, factor: FactorId) -> Result<ArrayView1<'_, f64>> {
        self.factors
            .iter()
            .position(|f| *f == factor)
            .map(|j| self.values.column(j))
            .ok_or(FaroError::UnknownFactor {
                factor,
                available: self.factors.len(),
            })
    }
}
