//! Rolling regime backtest on synthetic returns.
//!
//! This example demonstrates:
//! - Generating factor-structured returns with a high-volatility block
//! - Running the walk-forward backtest with full-sample calibration
//! - Re-running it with trailing calibration, which only uses past volatility
//! - Comparing performance and detected high-volatility spans

use faro::eval::RegimeSpan;
use faro::prelude::*;

/// Universe size.
const ASSETS: usize = 10;

/// Return rows.
const ROWS: usize = 750;

/// Estimation window in trading days.
const WINDOW: usize = 120;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let generator = SyntheticReturns::new(ASSETS, ROWS, 7);
    let returns = generator.generate()?;
    let stress = generator.stress_rows();

    println!("Synthetic universe: {ASSETS} assets, {ROWS} days");
    println!(
        "Stress block:       {} to {}",
        returns.dates()[stress.start],
        returns.dates()[stress.end - 1]
    );
    println!();

    let base = BacktestConfig {
        window: WINDOW,
        ..Default::default()
    };
    let trailing = BacktestConfig {
        calibration: CalibrationPolicy::expanding(60),
        ..base.clone()
    };

    for (label, config) in [("global", base), ("trailing", trailing)] {
        let result = RollingRegimeBacktester::new(config).run(&returns)?;
        let metrics = result.performance(0.0, 252);

        println!("── {label} calibration ──");
        println!("  Points:         {}", result.len());
        println!("  Threshold:      {:.6}", result.regime_threshold());
        println!("  High-vol days:  {}", result.high_vol_count());
        println!("  Ann. return:    {:.2}%", metrics.annualized_return * 100.0);
        println!("  Ann. vol:       {:.2}%", metrics.annualized_volatility * 100.0);
        println!("  Sharpe:         {:.2}", metrics.sharpe_ratio);
        println!("  Max drawdown:   {:.2}%", metrics.max_drawdown * 100.0);
        print_spans(&result.high_vol_spans());
        println!();
    }

    Ok(())
}

fn print_spans(spans: &[RegimeSpan]) {
    let longest = spans.iter().max_by_key(|s| s.len);
    match longest {
        Some(span) => println!(
            "  Longest span:   {} to {} ({} of {} spans)",
            span.start,
            span.end,
            span.len,
            spans.len()
        ),
        None => println!("  Longest span:   none"),
    }
}
