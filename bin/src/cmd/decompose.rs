//! Decomposition diagnostics command.

use std::path::PathBuf;

use anyhow::{Result, bail};
use faro_pca::{FactorModel, summary_report};

use crate::{OutputFormat, data};

/// Fit one factor model on the latest `window` rows and print diagnostics.
pub(crate) fn show_decomposition(
    tickers: &[String],
    data_dir: Option<PathBuf>,
    window: usize,
    components: usize,
    format: OutputFormat,
) -> Result<()> {
    let returns = data::load_returns(tickers, data_dir)?;
    if returns.len() < window {
        bail!(
            "only {} return rows available, window needs {}",
            returns.len(),
            window
        );
    }

    let slice = returns.window(returns.len() - window..returns.len())?;
    let model = FactorModel::fit(&slice, components)?;
    let factors = model.transform(&slice)?;
    let report = summary_report(&model, &factors)?;

    if format == OutputFormat::Json {
        #[derive(serde::Serialize)]
        struct Output<'a> {
            start: Option<faro_traits::Date>,
            end: Option<faro_traits::Date>,
            loadings: &'a faro_traits::Loadings,
            report: &'a faro_pca::DiagnosticsReport,
        }
        let output = Output {
            start: slice.dates().first().copied(),
            end: slice.last_date(),
            loadings: model.loadings(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Factor Decomposition                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    if let (Some(start), Some(end)) = (slice.dates().first(), slice.last_date()) {
        println!("Window:   {start} to {end} ({} rows)", slice.len());
    }
    println!("Assets:   {}", slice.assets().join(", "));
    println!();

    println!("Explained Variance:");
    println!("  {:<8}{:>12}{:>12}", "Factor", "Ratio", "Cumulative");
    for row in &report.explained_variance {
        println!(
            "  {:<8}{:>11.2}%{:>11.2}%",
            row.factor.to_string(),
            row.explained * 100.0,
            row.cumulative * 100.0
        );
    }
    println!(
        "  Market dominance: {:.2}%",
        report.market_dominance * 100.0
    );
    println!();

    let loadings = model.loadings();
    println!("Loadings:");
    print!("  {:<10}", "Asset");
    for factor in loadings.factors() {
        print!("{:>10}", factor.to_string());
    }
    println!();
    for (asset, row) in loadings.assets().iter().zip(loadings.values().rows()) {
        print!("  {asset:<10}");
        for value in row {
            print!("{value:>10.4}");
        }
        println!();
    }
    println!();

    let k = report.orthogonality.nrows();
    let max_off_diagonal = (0..k)
        .flat_map(|i| (0..k).filter(move |&j| j != i).map(move |j| (i, j)))
        .map(|(i, j)| report.orthogonality[[i, j]].abs())
        .fold(0.0_f64, f64::max);
    println!("Factor orthogonality (max |corr|): {max_off_diagonal:.2e}");
    println!();

    Ok(())
}
