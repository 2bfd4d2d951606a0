//! Rendering of backtest results.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use faro_eval::{BacktestConfig, BacktestResult, PerformanceMetrics, RegimeSpan, TRADING_DAYS_PER_YEAR};
use polars::prelude::*;
use serde::Serialize;

use crate::OutputFormat;

/// Weight rows shown in text output.
const PREVIEW_ROWS: usize = 5;

/// JSON view of a backtest.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    config: &'a BacktestConfig,
    evaluation_points: usize,
    regime_threshold: f64,
    high_vol_points: usize,
    metrics: PerformanceMetrics,
    high_vol_spans: Vec<RegimeSpan>,
    assets: &'a [String],
    final_weights: Option<Vec<f64>>,
}

/// Print a backtest result and optionally write its frame to CSV.
pub(crate) fn print_backtest(
    config: &BacktestConfig,
    result: &BacktestResult,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let metrics = result.performance(0.0, TRADING_DAYS_PER_YEAR);

    match format {
        OutputFormat::Json => {
            let summary = Summary {
                config,
                evaluation_points: result.len(),
                regime_threshold: result.regime_threshold(),
                high_vol_points: result.high_vol_count(),
                metrics,
                high_vol_spans: result.high_vol_spans(),
                assets: result.assets(),
                final_weights: result.records().last().map(|r| r.weights.view().to_vec()),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => print_text(config, result, &metrics),
    }

    if let Some(path) = output {
        write_csv(result, path)?;
        eprintln!("Wrote {} rows to {}", result.len(), path.display());
    }

    Ok(())
}

fn print_text(config: &BacktestConfig, result: &BacktestResult, metrics: &PerformanceMetrics) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("BACKTEST RESULTS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("Configuration:");
    println!("  Window:            {:>10}", config.window);
    println!("  Components:        {:>10}", config.n_components);
    println!("  Target Factor:     {:>10}", config.target_factor.to_string());
    println!("  High-Vol Scale:    {:>10.2}", config.risk_scale_high_vol);
    println!("  Vol Quantile:      {:>10.2}", config.vol_threshold_quantile);
    println!("  Calibration:       {:>10}", config.calibration.to_string());
    println!();

    println!("Performance Metrics:");
    println!("  Evaluation Points: {:>10}", result.len());
    println!("  Total Return:      {:>10.2}%", metrics.total_return * 100.0);
    println!("  Annualized Return: {:>10.2}%", metrics.annualized_return * 100.0);
    println!("  Annualized Vol:    {:>10.2}%", metrics.annualized_volatility * 100.0);
    println!("  Sharpe Ratio:      {:>10.2}", metrics.sharpe_ratio);
    println!("  Max Drawdown:      {:>10.2}%", metrics.max_drawdown * 100.0);
    println!();

    println!("Regime:");
    println!("  Threshold:         {:>10.6}", result.regime_threshold());
    println!("  High-Vol Points:   {:>10}", result.high_vol_count());
    let spans = result.high_vol_spans();
    if spans.is_empty() {
        println!("  High-Vol Spans:    none");
    } else {
        println!("  High-Vol Spans:");
        for span in &spans {
            println!("    {} to {} ({} days)", span.start, span.end, span.len);
        }
    }
    println!();

    println!("Weights (first {PREVIEW_ROWS} dates):");
    print!("  {:<12}", "Date");
    for asset in result.assets() {
        print!("{asset:>9}");
    }
    println!();
    for record in result.records().iter().take(PREVIEW_ROWS) {
        print!("  {:<12}", record.date.to_string());
        for w in record.weights.view() {
            print!("{w:>9.4}");
        }
        println!("{}", if record.high_vol { "  *" } else { "" });
    }
    println!();
}

/// Write the per-date result frame as CSV.
fn write_csv(result: &BacktestResult, path: &Path) -> Result<()> {
    let mut df = result.to_dataframe()?;
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}
