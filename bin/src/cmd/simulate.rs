//! Backtest command on synthetic returns.

use std::path::Path;

use anyhow::Result;
use faro_data::SyntheticReturns;
use faro_eval::RollingRegimeBacktester;
use tracing::info;

use crate::OutputFormat;
use crate::config::BacktestArgs;

/// Generate seeded factor-structured returns and backtest them.
pub(crate) fn run_simulation(
    assets: usize,
    rows: usize,
    seed: u64,
    args: &BacktestArgs,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = args.resolve()?;
    if args.window.is_none() && args.config.is_none() {
        // The 252-row default leaves little history in a 500-row sample.
        config.window = 100.max(assets + 1);
    }

    let generator = SyntheticReturns::new(assets, rows, seed);
    let returns = generator.generate()?;
    let stress = generator.stress_rows();
    info!(
        assets,
        rows,
        seed,
        stress_start = ?returns.dates().get(stress.start),
        "Generated synthetic returns"
    );

    let result = RollingRegimeBacktester::new(config.clone()).run(&returns)?;
    super::report::print_backtest(&config, &result, format, output)
}
