//! Error types for price ingestion.

use std::path::PathBuf;

use faro_traits::FaroError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while loading price files.
#[derive(Debug, Error)]
pub enum DataError {
    /// No tickers were requested.
    #[error("No tickers requested")]
    NoTickers,

    /// Price file does not exist.
    #[error("Price file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A required column is absent.
    #[error("Column '{column}' missing for {ticker}")]
    MissingColumn {
        /// Ticker being loaded.
        ticker: String,
        /// Missing column name.
        column: String,
    },

    /// Neither the configured nor the fallback price column exists.
    #[error("No usable price column for {0}")]
    NoPriceColumn(String),

    /// No date is shared by every ticker.
    #[error("No common dates across {0} tickers")]
    NoCommonDates(usize),

    /// Prices that cannot be turned into returns.
    #[error("Invalid prices: {0}")]
    InvalidPrices(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl From<DataError> for FaroError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Polars(e) => Self::Polars(e),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_into_faro_error() {
        let err: FaroError = DataError::NoPriceColumn("XLK".to_string()).into();
        assert!(matches!(err, FaroError::InvalidData(msg) if msg.contains("XLK")));
    }
}
