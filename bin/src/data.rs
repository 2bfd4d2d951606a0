//! Data loading utilities for the faro CLI.

use std::env;
use std::path::PathBuf;

use faro_data::{DEFAULT_DATA_DIR, PriceLoader, compute_log_returns};
use faro_traits::{FaroError, ReturnMatrix};
use tracing::info;

/// Environment variable naming the default price directory.
pub(crate) const DATA_DIR_ENV: &str = "FARO_DATA_DIR";

/// Resolve the price directory: explicit flag, then `FARO_DATA_DIR`, then
/// `data/raw`.
pub(crate) fn data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Normalize ticker arguments: trimmed, upper-cased, empty entries dropped.
pub(crate) fn normalize_tickers(tickers: &[String]) -> Vec<String> {
    tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Load aligned prices for `tickers` and convert them to log returns.
pub(crate) fn load_returns(
    tickers: &[String],
    data_dir: Option<PathBuf>,
) -> Result<ReturnMatrix, FaroError> {
    let dir = self::data_dir(data_dir);
    let tickers = normalize_tickers(tickers);
    info!(dir = %dir.display(), tickers = tickers.len(), "Loading prices");

    let prices = PriceLoader::with_data_dir(dir).load_prices(&tickers)?;
    let returns = compute_log_returns(&prices)?;

    info!(
        rows = returns.len(),
        first = ?returns.dates().first(),
        last = ?returns.dates().last(),
        "Computed log returns"
    );
    Ok(returns)
}
