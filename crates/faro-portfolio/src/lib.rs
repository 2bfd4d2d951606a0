//! Factor-targeted portfolio construction for faro.
//!
//! This crate converts a fitted factor model's loadings into portfolio
//! weights and scores them against realized returns.
//!
//! # Examples
//!
//! ```rust,no_run
//! use faro_portfolio::{AllocationEngine, WeightVector};
//! use ndarray::array;
//!
//! let weights = WeightVector::new(array![0.5, -0.5]);
//! let pnl = AllocationEngine::score(&weights, array![0.01, -0.02].view()).unwrap();
//! assert!((pnl - 0.015).abs() < 1e-12);
//! ```

mod engine;
mod weights;

// Re-export main types
pub use engine::AllocationEngine;
pub use weights::{WeightMatrix, WeightVector};
