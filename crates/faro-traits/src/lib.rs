#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/faro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the faro rolling factor model.
//!
//! This crate provides the foundational vocabulary shared by the
//! decomposition, allocation and backtest crates.

/// The version of the faro-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{FaroError, Result};
pub use types::{Date, FactorId, Loadings, ReturnMatrix, ReturnWindow, Symbol};
