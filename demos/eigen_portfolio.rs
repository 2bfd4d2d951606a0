//! Single-window decomposition and eigen-portfolio construction.
//!
//! This example demonstrates:
//! - Fitting a factor model on one window
//! - Inspecting explained variance and factor contributions
//! - Building the second factor's eigen-portfolio and its exposures
//! - Neutralizing the leading factor out of the window's returns

use faro::pca::{explained_variance_table, factor_contributions, neutralize_factors};
use faro::prelude::*;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let returns = SyntheticReturns::new(8, 300, 21).generate()?;
    let window = returns.window(0..250)?;

    let mut decomposer = FactorDecomposer::new(3)?;
    let model = decomposer.fit(&window)?;

    println!("Explained variance:");
    for row in explained_variance_table(model) {
        println!(
            "  {}  {:>6.2}%  (cumulative {:>6.2}%)",
            row.factor,
            row.explained * 100.0,
            row.cumulative * 100.0
        );
    }
    println!();

    let contributions = factor_contributions(model)?;
    let leading = contributions.column(FactorId::LEADING)?;
    println!("Leading-factor contributions:");
    for (asset, share) in contributions.assets().iter().zip(leading.iter()) {
        println!("  {asset}  {:>6.2}%", share * 100.0);
    }
    println!();

    let engine = AllocationEngine::new(&window, model.loadings(), FactorId::SECOND)?;
    let weights = engine.evaluation_weights()?;
    println!("{} eigen-portfolio:", engine.target());
    for (asset, w) in engine.assets().iter().zip(weights.view()) {
        println!("  {asset}  {w:>8.4}");
    }
    println!(
        "  gross {:.4}, net {:.4}",
        weights.gross_exposure(),
        weights.net_exposure()
    );
    println!();

    let residual = neutralize_factors(model, &window, 1)?;
    let raw_var: f64 = window.values().var(1.0);
    let residual_var: f64 = residual.values().var(1.0);
    println!(
        "Variance after removing {}: {:.2}% of the original",
        FactorId::LEADING,
        residual_var / raw_var * 100.0
    );

    Ok(())
}
