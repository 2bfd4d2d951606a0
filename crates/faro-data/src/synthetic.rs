//! Reproducible factor-structured returns.
//!
//! Each asset is driven by a common market factor, one sector factor and
//! idiosyncratic noise. A stress block in the middle of the sample raises
//! market volatility so regime detection has something to find.

use chrono::{Datelike, Weekday};
use faro_traits::{Date, FaroError, Result, ReturnMatrix, Symbol};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Generator for synthetic daily returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticReturns {
    /// Number of assets.
    pub n_assets: usize,
    /// Number of return rows.
    pub n_rows: usize,
    /// Number of sector factors.
    pub n_sectors: usize,
    /// RNG seed.
    pub seed: u64,
    /// Daily market drift.
    pub market_drift: f64,
    /// Daily market volatility in calm periods.
    pub market_vol: f64,
    /// Daily sector factor volatility.
    pub sector_vol: f64,
    /// Daily idiosyncratic volatility.
    pub idio_vol: f64,
    /// Market volatility multiplier inside the stress block.
    pub stress_multiplier: f64,
    /// First calendar date; weekends are skipped.
    pub start: Date,
}

impl Default for SyntheticReturns {
    fn default() -> Self {
        Self {
            n_assets: 10,
            n_rows: 500,
            n_sectors: 2,
            seed: 42,
            market_drift: 0.0003,
            market_vol: 0.01,
            sector_vol: 0.006,
            idio_vol: 0.004,
            stress_multiplier: 2.5,
            start: Date::from_ymd_opt(2020, 1, 2).unwrap_or_default(),
        }
    }
}

impl SyntheticReturns {
    /// Generator with the given shape and seed, other parameters default.
    pub fn new(n_assets: usize, n_rows: usize, seed: u64) -> Self {
        Self {
            n_assets,
            n_rows,
            seed,
            ..Self::default()
        }
    }

    /// Asset names `S00`, `S01`, ...
    pub fn asset_names(&self) -> Vec<Symbol> {
        (0..self.n_assets).map(|i| format!("S{i:02}")).collect()
    }

    /// Index range of the high-volatility block: the middle fifth of the sample.
    pub const fn stress_rows(&self) -> std::ops::Range<usize> {
        let start = self.n_rows * 2 / 5;
        start..start + self.n_rows / 5
    }

    /// Draw the return matrix.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::InvalidConfig`] for an empty shape or negative
    /// volatilities.
    pub fn generate(&self) -> Result<ReturnMatrix> {
        if self.n_assets == 0 || self.n_rows == 0 {
            return Err(FaroError::InvalidConfig(format!(
                "synthetic shape must be non-empty, got {}x{}",
                self.n_rows, self.n_assets
            )));
        }
        let n_sectors = self.n_sectors.max(1);

        let normal = |std: f64| {
            Normal::new(0.0, std)
                .map_err(|e| FaroError::InvalidConfig(format!("invalid volatility {std}: {e}")))
        };
        let market = normal(self.market_vol)?;
        let sector = normal(self.sector_vol)?;
        let idio = normal(self.idio_vol)?;

        let mut rng = StdRng::seed_from_u64(self.seed);

        let betas: Vec<f64> = (0..self.n_assets)
            .map(|_| rng.gen_range(0.7..1.3))
            .collect();
        let sector_loadings: Vec<f64> = (0..self.n_assets)
            .map(|_| rng.gen_range(0.5..1.5))
            .collect();

        let stress = self.stress_rows();
        let mut values = Array2::zeros((self.n_rows, self.n_assets));
        for (t, mut row) in values.rows_mut().into_iter().enumerate() {
            let multiplier = if stress.contains(&t) {
                self.stress_multiplier
            } else {
                1.0
            };
            let m = self.market_drift + multiplier * market.sample(&mut rng);
            let sectors: Vec<f64> = (0..n_sectors).map(|_| sector.sample(&mut rng)).collect();

            for (i, r) in row.iter_mut().enumerate() {
                *r = betas[i] * m + sector_loadings[i] * sectors[i % n_sectors] + idio.sample(&mut rng);
            }
        }

        ReturnMatrix::new(
            business_days(self.start, self.n_rows),
            self.asset_names(),
            values,
        )
    }
}

/// The first `n` weekdays on or after `start`.
pub fn business_days(start: Date, n: usize) -> Vec<Date> {
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(n)
        .collect()
}
