//! CSV price ingestion.
//!
//! One file per ticker, `<data_dir>/<TICKER>.csv`, with a date column and a
//! price column. Every ticker is cleaned independently and the result is
//! inner-joined on dates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use faro_traits::{Date, Symbol};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DataError;

/// Default directory for price files.
pub const DEFAULT_DATA_DIR: &str = "data/raw";

/// Configuration for [`PriceLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceLoaderConfig {
    /// Directory containing one CSV per ticker.
    pub data_dir: PathBuf,
    /// Preferred price column.
    pub price_column: String,
    /// Column used when the preferred one is absent.
    pub fallback_column: String,
    /// Date column.
    pub date_column: String,
}

impl Default for PriceLoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            price_column: "Adj Close".to_string(),
            fallback_column: "Close".to_string(),
            date_column: "Date".to_string(),
        }
    }
}

/// Aligned prices: rows are dates, columns are tickers.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFrame {
    dates: Vec<Date>,
    assets: Vec<Symbol>,
    values: Array2<f64>,
}

impl PriceFrame {
    /// Build a price frame.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidPrices`] if the shape disagrees with the
    /// dates or assets.
    pub fn new(dates: Vec<Date>, assets: Vec<Symbol>, values: Array2<f64>) -> Result<Self, DataError> {
        if values.dim() != (dates.len(), assets.len()) {
            return Err(DataError::InvalidPrices(format!(
                "expected {}x{} prices, got {}x{}",
                dates.len(),
                assets.len(),
                values.nrows(),
                values.ncols()
            )));
        }
        Ok(Self {
            dates,
            assets,
            values,
        })
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the frame has no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row dates, ascending.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Tickers in column order.
    pub fn assets(&self) -> &[Symbol] {
        &self.assets
    }

    /// The raw price matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

/// Loads per-ticker price CSVs into an aligned [`PriceFrame`].
#[derive(Debug, Clone, Default)]
pub struct PriceLoader {
    config: PriceLoaderConfig,
}

impl PriceLoader {
    /// Create a loader with the given configuration.
    pub const fn new(config: PriceLoaderConfig) -> Self {
        Self { config }
    }

    /// Create a loader with default columns reading from `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(PriceLoaderConfig {
            data_dir: data_dir.into(),
            ..PriceLoaderConfig::default()
        })
    }

    /// The loader configuration.
    pub const fn config(&self) -> &PriceLoaderConfig {
        &self.config
    }

    /// Path of the CSV for `ticker`.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.config.data_dir.join(format!("{ticker}.csv"))
    }

    /// Load and align prices for `tickers`.
    ///
    /// Dates missing for any ticker are dropped.
    ///
    /// # Errors
    ///
    /// Fails if a file or required column is missing, or if no date is
    /// shared by every ticker.
    pub fn load_prices<S: AsRef<str>>(&self, tickers: &[S]) -> Result<PriceFrame, DataError> {
        if tickers.is_empty() {
            return Err(DataError::NoTickers);
        }

        let series = tickers
            .iter()
            .map(|t| self.load_series(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let all_dates: usize = series.iter().map(BTreeMap::len).max().unwrap_or(0);
        let dates: Vec<Date> = series[0]
            .keys()
            .filter(|&d| series.iter().all(|s| s.contains_key(d)))
            .copied()
            .collect();

        if dates.is_empty() {
            return Err(DataError::NoCommonDates(tickers.len()));
        }
        if dates.len() < all_dates {
            warn!(
                dropped = all_dates - dates.len(),
                kept = dates.len(),
                "Dropped dates not shared by every ticker"
            );
        }

        let values = Array2::from_shape_fn((dates.len(), series.len()), |(i, j)| {
            series[j].get(&dates[i]).copied().unwrap_or(f64::NAN)
        });
        let assets = tickers.iter().map(|t| t.as_ref().to_string()).collect();

        PriceFrame::new(dates, assets, values)
    }

    /// Load one ticker as a date-sorted price map.
    fn load_series(&self, ticker: &str) -> Result<BTreeMap<Date, f64>, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::MissingFile(path));
        }

        let df = read_csv(&path)?;

        let date_column = &self.config.date_column;
        if df.column(date_column).is_err() {
            return Err(DataError::MissingColumn {
                ticker: ticker.to_string(),
                column: date_column.clone(),
            });
        }

        let price_column = if df.column(&self.config.price_column).is_ok() {
            &self.config.price_column
        } else if df.column(&self.config.fallback_column).is_ok() {
            warn!(
                ticker,
                missing = %self.config.price_column,
                using = %self.config.fallback_column,
                "Price column absent, using fallback"
            );
            &self.config.fallback_column
        } else {
            return Err(DataError::NoPriceColumn(ticker.to_string()));
        };

        let dates = df.column(date_column)?.as_materialized_series().str()?;
        let prices = df.column(price_column)?.as_materialized_series().str()?;

        let mut series = BTreeMap::new();
        let mut skipped = 0usize;
        for (date, price) in dates.into_iter().zip(prices.into_iter()) {
            match (date.and_then(parse_date), price.and_then(parse_price)) {
                (Some(d), Some(p)) => {
                    series.insert(d, p);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(ticker, skipped, "Skipped rows with unparseable date or price");
        }
        debug!(ticker, rows = series.len(), path = %path.display(), "Loaded prices");

        Ok(series)
    }
}

/// Read every column of a CSV as text.
fn read_csv(path: &Path) -> Result<DataFrame, DataError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Parse the leading `YYYY-MM-DD` of a date or timestamp string.
fn parse_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Parse a price after stripping everything but digits, `.`, `-` and `e`.
fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}
