//! Principal-factor decomposition for faro.
//!
//! This crate turns a window of asset returns into a statistical factor
//! model:
//! - Per-asset standardization and a correlation-matrix eigendecomposition
//! - Factor loadings ("eigen-portfolios") and explained-variance ratios
//! - Projection into factor space and reconstruction back to asset space
//! - Factor neutralization and decomposition diagnostics
//!
//! # Example
//!
//! ```rust,ignore
//! use faro_pca::FactorDecomposer;
//! use faro_traits::FactorId;
//!
//! let mut decomposer = FactorDecomposer::new(3)?;
//! decomposer.fit(&returns.window(0..252)?)?;
//! let eigen_portfolio = decomposer.loadings()?.column(FactorId::SECOND)?;
//! ```

pub mod decomposer;
pub mod diagnostics;
pub mod eigen;
pub mod residual;

// Re-export main types
pub use decomposer::{FactorDecomposer, FactorModel, FactorSeries};
pub use diagnostics::{
    DiagnosticsReport, ExplainedVarianceRow, explained_variance_table, factor_contributions,
    factor_orthogonality, market_dominance, summary_report,
};
pub use eigen::{EigenDecomposition, jacobi_eigendecomp};
pub use residual::{extract_residual_signal, neutralize_factors};
