//! Backtest command on price files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use faro_eval::RollingRegimeBacktester;

use crate::config::BacktestArgs;
use crate::{OutputFormat, data};

/// Load prices for `tickers`, run the walk-forward backtest and report it.
pub(crate) fn run_backtest(
    tickers: &[String],
    data_dir: Option<PathBuf>,
    args: &BacktestArgs,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let config = args.resolve()?;
    let returns = data::load_returns(tickers, data_dir)?;

    let result = RollingRegimeBacktester::new(config.clone()).run(&returns)?;
    super::report::print_backtest(&config, &result, format, output)
}
