//! Decomposition diagnostics.
//!
//! Summaries used to sanity-check a fitted model: how concentrated the
//! variance is, which assets drive each factor, and whether the projected
//! factor series are actually uncorrelated.

use faro_traits::{FactorId, Loadings, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::decomposer::{FactorModel, FactorSeries};

/// One row of the explained-variance table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplainedVarianceRow {
    /// Factor identifier.
    pub factor: FactorId,
    /// Fraction of total variance explained by this factor.
    pub explained: f64,
    /// Fraction explained by this factor and all higher-ranked ones.
    pub cumulative: f64,
}

/// Explained and cumulative variance per factor.
pub fn explained_variance_table(model: &FactorModel) -> Vec<ExplainedVarianceRow> {
    let mut cumulative = 0.0;
    model
        .loadings()
        .factors()
        .iter()
        .zip(model.explained_variance().iter())
        .map(|(&factor, &explained)| {
            cumulative += explained;
            ExplainedVarianceRow {
                factor,
                explained,
                cumulative,
            }
        })
        .collect()
}

/// Variance contribution of each asset to each factor.
///
/// Squared loadings normalized so every factor column sums to one.
///
/// # Errors
///
/// Propagates shape errors from building the [`Loadings`].
pub fn factor_contributions(model: &FactorModel) -> Result<Loadings> {
    let loadings = model.loadings();
    let mut squared = loadings.values().mapv(|w| w * w);
    for mut column in squared.columns_mut() {
        let total = column.sum();
        if total > 0.0 {
            column /= total;
        }
    }
    Loadings::new(
        loadings.assets().to_vec(),
        loadings.factors().to_vec(),
        squared,
    )
}

/// Share of variance explained by the leading (market) factor.
pub fn market_dominance(model: &FactorModel) -> f64 {
    model.explained_variance().get(0).copied().unwrap_or(f64::NAN)
}

/// Empirical correlation matrix of the factor series; close to identity.
pub fn factor_orthogonality(factors: &FactorSeries) -> Array2<f64> {
    factors.correlation()
}

/// All diagnostics for one fitted window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    /// Explained-variance table.
    pub explained_variance: Vec<ExplainedVarianceRow>,
    /// Leading-factor variance share.
    pub market_dominance: f64,
    /// Factor correlation matrix.
    pub orthogonality: Array2<f64>,
    /// Per-asset variance contributions.
    pub contributions: Loadings,
}

/// Build a [`DiagnosticsReport`] for a model and its projected factors.
///
/// # Errors
///
/// See [`factor_contributions`].
pub fn summary_report(model: &FactorModel, factors: &FactorSeries) -> Result<DiagnosticsReport> {
    Ok(DiagnosticsReport {
        explained_variance: explained_variance_table(model),
        market_dominance: market_dominance(model),
        orthogonality: factor_orthogonality(factors),
        contributions: factor_contributions(model)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::factor_returns;
    use approx::assert_abs_diff_eq;
    use faro_traits::ReturnWindow;

    fn model_and_series() -> (FactorModel, FactorSeries) {
        let (dates, assets, values) = factor_returns(100, 5);
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();
        let model = FactorModel::fit(&window, 3).unwrap();
        let series = model.transform(&window).unwrap();
        (model, series)
    }

    #[test]
    fn test_explained_variance_table_cumulates() {
        let (model, _) = model_and_series();
        let table = explained_variance_table(&model);

        assert_eq!(table.len(), 3);
        assert_eq!(table[0].factor, FactorId::LEADING);
        assert_abs_diff_eq!(table[0].cumulative, table[0].explained);
        assert_abs_diff_eq!(
            table[2].cumulative,
            model.explained_variance().sum(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_contributions_sum_to_one() {
        let (model, _) = model_and_series();
        let contributions = factor_contributions(&model).unwrap();

        for column in contributions.values().columns() {
            assert_abs_diff_eq!(column.sum(), 1.0, epsilon = 1e-12);
            assert!(column.iter().all(|&c| c >= 0.0));
        }
    }

    #[test]
    fn test_summary_report() {
        let (model, series) = model_and_series();
        let report = summary_report(&model, &series).unwrap();

        assert_abs_diff_eq!(report.market_dominance, model.explained_variance()[0]);
        assert_eq!(report.orthogonality.dim(), (3, 3));
        assert_abs_diff_eq!(report.orthogonality[[0, 0]], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.orthogonality[[0, 1]], 0.0, epsilon = 1e-9);
    }
}
