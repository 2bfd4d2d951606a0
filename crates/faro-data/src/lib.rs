//! Data ingestion for faro.
//!
//! This crate turns raw inputs into a [`ReturnMatrix`](faro_traits::ReturnMatrix):
//! - [`PriceLoader`] reads one CSV per ticker and aligns them on common dates
//! - [`compute_log_returns`] converts aligned prices into log returns
//! - [`SyntheticReturns`] generates reproducible factor-structured returns
//!
//! # Usage
//!
//! ```rust,ignore
//! use faro_data::{PriceLoader, compute_log_returns};
//!
//! let prices = PriceLoader::with_data_dir("data/raw").load_prices(&["XLK", "XLF", "XLE"])?;
//! let returns = compute_log_returns(&prices)?;
//! ```
//!
//! # Environment Variables
//!
//! The CLI reads the default data directory from `FARO_DATA_DIR`:
//!
//! ```bash
//! FARO_DATA_DIR=data/raw
//! ```

mod error;
mod loader;
mod returns;
pub mod synthetic;

pub use error::DataError;
pub use loader::{DEFAULT_DATA_DIR, PriceFrame, PriceLoader, PriceLoaderConfig};
pub use returns::compute_log_returns;
pub use synthetic::SyntheticReturns;
