//! Principal-factor decomposition of a return window.
//!
//! Each asset column is standardized to zero mean and unit variance over the
//! window, and the correlation matrix of the standardized returns is
//! diagonalized. The leading eigenvectors are the factor loadings
//! ("eigen-portfolios"); their eigenvalues over the total variance are the
//! explained-variance ratios.
//!
//! A model is fitted from scratch for every window. The covariance structure
//! is treated as non-stationary, so nothing is carried over between windows.

use faro_traits::stats::MIN_STD_THRESHOLD;
use faro_traits::{Date, FactorId, FaroError, Loadings, Result, ReturnMatrix, ReturnWindow, Symbol};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::eigen::jacobi_eigendecomp;

/// A fitted principal-factor model for one window.
///
/// Holds the standardization parameters, the loading matrix and the
/// explained-variance profile. Produced by [`FactorModel::fit`] or
/// [`FactorDecomposer::fit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorModel {
    mean: Array1<f64>,
    scale: Array1<f64>,
    loadings: Loadings,
    eigenvalues: Array1<f64>,
    explained_variance_ratio: Array1<f64>,
    n_observations: usize,
}

impl FactorModel {
    /// Fit a model with `n_components` factors on a window.
    ///
    /// # Errors
    ///
    /// - [`FaroError::NotEnoughData`] if the window has fewer than
    ///   `assets + 1` rows, holds non-finite values, or has no variance.
    /// - [`FaroError::InvalidConfig`] if `n_components` is zero or exceeds
    ///   the number of assets.
    pub fn fit(window: &ReturnWindow<'_>, n_components: usize) -> Result<Self> {
        let n_obs = window.len();
        let n_assets = window.n_assets();

        if n_assets == 0 {
            return Err(FaroError::NotEnoughData(
                "window has no assets".to_string(),
            ));
        }
        if n_obs < n_assets + 1 {
            return Err(FaroError::NotEnoughData(format!(
                "window has {n_obs} rows for {n_assets} assets, need at least {}",
                n_assets + 1
            )));
        }
        if let Some(((row, col), _)) = window
            .values()
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(FaroError::NotEnoughData(format!(
                "window has a non-finite return for {} on {}",
                window.assets()[col],
                window.dates()[row]
            )));
        }
        if n_components == 0 || n_components > n_assets {
            return Err(FaroError::InvalidConfig(format!(
                "n_components must be in [1, {n_assets}], got {n_components}"
            )));
        }

        let x = window.values();
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| FaroError::NotEnoughData("empty window".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s < MIN_STD_THRESHOLD { 1.0 } else { s });

        let z = (&x - &mean) / &scale;
        let correlation = z.t().dot(&z) / (n_obs - 1) as f64;

        let eig = jacobi_eigendecomp(&correlation)?;
        let all_eigenvalues = eig.eigenvalues.mapv(|e| e.max(0.0));
        let total_variance = all_eigenvalues.sum();
        if total_variance <= MIN_STD_THRESHOLD {
            return Err(FaroError::NotEnoughData(
                "window has no return variance".to_string(),
            ));
        }

        let eigenvalues = all_eigenvalues.slice(ndarray::s![..n_components]).to_owned();
        let explained_variance_ratio = &eigenvalues / total_variance;
        let loading_values = eig
            .eigenvectors
            .slice(ndarray::s![.., ..n_components])
            .to_owned();
        let loadings = Loadings::new(
            window.assets().to_vec(),
            FactorId::first(n_components),
            loading_values,
        )?;

        tracing::trace!(
            n_obs,
            n_assets,
            leading_ratio = explained_variance_ratio[0],
            "fitted factor model"
        );

        Ok(Self {
            mean,
            scale,
            loadings,
            eigenvalues,
            explained_variance_ratio,
            n_observations: n_obs,
        })
    }

    /// Number of factors kept.
    pub fn n_components(&self) -> usize {
        self.loadings.n_factors()
    }

    /// Number of assets the model was fitted on.
    pub fn n_assets(&self) -> usize {
        self.loadings.n_assets()
    }

    /// Number of rows in the fitting window.
    pub const fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Asset names in fit order.
    pub fn assets(&self) -> &[Symbol] {
        self.loadings.assets()
    }

    /// Per-asset means used for standardization.
    pub const fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Per-asset scales (population standard deviations) used for standardization.
    pub const fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// The `assets x factors` loading matrix.
    pub const fn loadings(&self) -> &Loadings {
        &self.loadings
    }

    /// Variance captured by each kept factor, in standardized units.
    pub const fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Fraction of total variance explained by each kept factor, descending.
    pub const fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance_ratio
    }

    /// Project returns onto the factors using the fit-time standardization.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::InvalidData`] if the window's assets differ from
    /// the fitted assets.
    pub fn transform(&self, window: &ReturnWindow<'_>) -> Result<FactorSeries> {
        if window.assets() != self.assets() {
            return Err(FaroError::InvalidData(format!(
                "transform expects assets {:?}, got {:?}",
                self.assets(),
                window.assets()
            )));
        }

        let z = (&window.values() - &self.mean) / &self.scale;
        let values = z.dot(self.loadings.values());

        Ok(FactorSeries {
            dates: window.dates().to_vec(),
            factors: self.loadings.factors().to_vec(),
            values,
        })
    }

    /// Map factor values back to asset returns.
    ///
    /// Uses the first `n_components` factors (all kept factors when `None`)
    /// and undoes the standardization.
    ///
    /// # Errors
    ///
    /// - [`FaroError::InvalidConfig`] if `n_components` exceeds the factors
    ///   available in either the model or the series.
    /// - [`FaroError::InvalidData`] if the reconstruction is not a valid
    ///   return matrix.
    pub fn reconstruct(&self, factors: &FactorSeries, n_components: Option<usize>) -> Result<ReturnMatrix> {
        let available = self.n_components().min(factors.n_factors());
        let k = n_components.unwrap_or(available);
        if k == 0 || k > available {
            return Err(FaroError::InvalidConfig(format!(
                "cannot reconstruct from {k} factors, {available} available"
            )));
        }

        let w = self.loadings.values().slice(ndarray::s![.., ..k]);
        let f = factors.values.slice(ndarray::s![.., ..k]);
        let standardized = f.dot(&w.t());
        let values = standardized * &self.scale + &self.mean;

        ReturnMatrix::new(factors.dates.clone(), self.assets().to_vec(), values)
    }
}

/// Projection of a window's returns onto a model's factors.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSeries {
    dates: Vec<Date>,
    factors: Vec<FactorId>,
    values: Array2<f64>,
}

impl FactorSeries {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of factors.
    pub fn n_factors(&self) -> usize {
        self.factors.len()
    }

    /// Row dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Factor identifiers in column order.
    pub fn factors(&self) -> &[FactorId] {
        &self.factors
    }

    /// The raw `rows x factors` matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// The series of one factor.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::UnknownFactor`] if the factor was not kept.
    pub fn column(&self, factor: FactorId) -> Result<ArrayView1<'_, f64>> {
        self.factors
            .iter()
            .position(|f| *f == factor)
            .map(|j| self.values.column(j))
            .ok_or(FaroError::UnknownFactor {
                factor,
                available: self.factors.len(),
            })
    }

    /// Sample standard deviation (ddof 1) of one factor's series.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::UnknownFactor`] if the factor was not kept and
    /// [`FaroError::NotEnoughData`] for fewer than two rows.
    pub fn std(&self, factor: FactorId) -> Result<f64> {
        if self.len() < 2 {
            return Err(FaroError::NotEnoughData(format!(
                "factor dispersion needs at least 2 rows, got {}",
                self.len()
            )));
        }
        Ok(self.column(factor)?.std(1.0))
    }

    /// Pearson correlation matrix between factor series.
    ///
    /// Factors from one window are uncorrelated in-sample, so for a
    /// transformed fitting window this is the identity up to rounding.
    pub fn correlation(&self) -> Array2<f64> {
        let k = self.n_factors();
        let n = self.len();
        let mut corr = Array2::from_elem((k, k), f64::NAN);
        if n < 2 {
            return corr;
        }

        let Some(mean) = self.values.mean_axis(Axis(0)) else {
            return corr;
        };
        let centered = &self.values - &mean;
        let cov = centered.t().dot(&centered) / (n - 1) as f64;

        for i in 0..k {
            for j in 0..k {
                let denom = (cov[[i, i]] * cov[[j, j]]).sqrt();
                if denom > MIN_STD_THRESHOLD {
                    corr[[i, j]] = cov[[i, j]] / denom;
                }
            }
        }
        corr
    }
}

/// Stateful decomposer: configured with a component count, fitted on a
/// window, then queried.
///
/// # Example
///
/// ```rust,ignore
/// use faro_pca::FactorDecomposer;
/// use faro_traits::FactorId;
///
/// let mut decomposer = FactorDecomposer::new(3)?;
/// decomposer.fit(&window)?;
/// let factors = decomposer.transform(&window)?;
/// let leading_vol = factors.std(FactorId::LEADING)?;
/// ```
#[derive(Debug, Clone)]
pub struct FactorDecomposer {
    n_components: usize,
    model: Option<FactorModel>,
}

impl FactorDecomposer {
    /// Create an unfitted decomposer keeping `n_components` factors.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::InvalidConfig`] if `n_components` is zero.
    pub fn new(n_components: usize) -> Result<Self> {
        if n_components == 0 {
            return Err(FaroError::InvalidConfig(
                "n_components must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            n_components,
            model: None,
        })
    }

    /// Configured number of factors.
    pub const fn n_components(&self) -> usize {
        self.n_components
    }

    /// Whether `fit` has succeeded.
    pub const fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fit on a window, replacing any previous model.
    ///
    /// On failure the decomposer keeps its previous state.
    ///
    /// # Errors
    ///
    /// See [`FactorModel::fit`].
    pub fn fit(&mut self, window: &ReturnWindow<'_>) -> Result<&FactorModel> {
        let model = FactorModel::fit(window, self.n_components)?;
        Ok(&*self.model.insert(model))
    }

    /// The fitted model.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::NotFitted`] before a successful `fit`.
    pub fn model(&self) -> Result<&FactorModel> {
        self.model.as_ref().ok_or(FaroError::NotFitted("model"))
    }

    /// Consume the decomposer, returning the fitted model.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::NotFitted`] before a successful `fit`.
    pub fn into_model(self) -> Result<FactorModel> {
        self.model.ok_or(FaroError::NotFitted("into_model"))
    }

    /// Project returns onto the fitted factors.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::NotFitted`] before `fit`; see [`FactorModel::transform`].
    pub fn transform(&self, window: &ReturnWindow<'_>) -> Result<FactorSeries> {
        self.model
            .as_ref()
            .ok_or(FaroError::NotFitted("transform"))?
            .transform(window)
    }

    /// The `assets x factors` loading matrix.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::NotFitted`] before `fit`.
    pub fn loadings(&self) -> Result<&Loadings> {
        self.model
            .as_ref()
            .map(FactorModel::loadings)
            .ok_or(FaroError::NotFitted("loadings"))
    }

    /// Explained-variance ratios per factor, descending.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::NotFitted`] before `fit`.
    pub fn explained_variance(&self) -> Result<&Array1<f64>> {
        self.model
            .as_ref()
            .map(FactorModel::explained_variance)
            .ok_or(FaroError::NotFitted("explained_variance"))
    }

    /// Map factor values back to asset space.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::NotFitted`] before `fit`; see [`FactorModel::reconstruct`].
    pub fn reconstruct(&self, factors: &FactorSeries, n_components: Option<usize>) -> Result<ReturnMatrix> {
        self.model
            .as_ref()
            .ok_or(FaroError::NotFitted("reconstruct"))?
            .reconstruct(factors, n_components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::factor_returns;
    use approx::assert_abs_diff_eq;

    fn fitted(n_obs: usize, n_assets: usize, k: usize) -> (ReturnMatrix, FactorDecomposer) {
        let (dates, assets, values) = factor_returns(n_obs, n_assets);
        let returns = ReturnMatrix::new(dates, assets, values).unwrap();
        let mut decomposer = FactorDecomposer::new(k).unwrap();
        decomposer.fit(&returns.window(0..n_obs).unwrap()).unwrap();
        (returns, decomposer)
    }

    #[test]
    fn test_explained_variance_profile() {
        let (_, decomposer) = fitted(120, 6, 4);
        let ratios = decomposer.explained_variance().unwrap();

        assert_eq!(ratios.len(), 4);
        assert!(ratios.iter().all(|&r| r >= 0.0));
        assert!(ratios.iter().zip(ratios.iter().skip(1)).all(|(a, b)| a >= b));
        assert!(ratios.sum() <= 1.0 + 1e-12);
        // The market factor dominates this construction.
        assert!(ratios[0] > 0.5);
    }

    #[test]
    fn test_all_components_explain_everything() {
        let (_, decomposer) = fitted(80, 5, 5);
        assert_abs_diff_eq!(decomposer.explained_variance().unwrap().sum(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_loadings_orthonormal() {
        let (_, decomposer) = fitted(120, 8, 3);
        let w = decomposer.loadings().unwrap().values();

        let gram = w.t().dot(w);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_transform_idempotent() {
        let (returns, decomposer) = fitted(100, 5, 3);
        let window = returns.window(0..100).unwrap();

        let first = decomposer.transform(&window).unwrap();
        let second = decomposer.transform(&window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_factor_series_matches_eigenvalues() {
        let (returns, decomposer) = fitted(150, 6, 3);
        let window = returns.window(0..150).unwrap();
        let series = decomposer.transform(&window).unwrap();
        let model = decomposer.model().unwrap();

        let leading_vol = series.std(FactorId::LEADING).unwrap();
        assert_abs_diff_eq!(leading_vol, model.eigenvalues()[0].sqrt(), epsilon = 1e-9);

        let corr = series.correlation();
        assert_abs_diff_eq!(corr[[0, 1]], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(corr[[1, 2]], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(corr[[2, 2]], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transform_uses_fit_time_parameters() {
        let (returns, decomposer) = fitted(100, 4, 2);
        let model = decomposer.model().unwrap();
        let tail = returns.window(90..100).unwrap();
        let series = decomposer.transform(&tail).unwrap();

        let values = tail.values();
        let row = values.row(0);
        let z = (&row - model.mean()) / model.scale();
        let expected = z.dot(&model.loadings().values().column(0));
        assert_abs_diff_eq!(series.values()[[0, 0]], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_reconstruct_full_rank_recovers_returns() {
        let (returns, decomposer) = fitted(60, 4, 4);
        let window = returns.window(0..60).unwrap();
        let series = decomposer.transform(&window).unwrap();

        let rebuilt = decomposer.reconstruct(&series, None).unwrap();
        for (x, y) in rebuilt.values().iter().zip(returns.values().iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
        assert!(decomposer.reconstruct(&series, Some(5)).is_err());
    }

    #[test]
    fn test_fit_rejects_short_window() {
        let (dates, assets, values) = factor_returns(5, 10);
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();
        let mut decomposer = FactorDecomposer::new(3).unwrap();

        let result = decomposer.fit(&window);
        assert!(matches!(result, Err(FaroError::NotEnoughData(_))));
        assert!(!decomposer.is_fitted());
    }

    #[test]
    fn test_fit_requires_assets_plus_one_rows() {
        let (dates, assets, values) = factor_returns(10, 10);
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();
        assert!(matches!(
            FactorModel::fit(&window, 2),
            Err(FaroError::NotEnoughData(_))
        ));

        let (dates, assets, values) = factor_returns(11, 10);
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();
        assert!(FactorModel::fit(&window, 2).is_ok());
    }

    #[test]
    fn test_fit_rejects_non_finite() {
        let (dates, assets, mut values) = factor_returns(30, 4);
        values[[7, 2]] = f64::INFINITY;
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();

        assert!(matches!(
            FactorModel::fit(&window, 2),
            Err(FaroError::NotEnoughData(_))
        ));
    }

    #[test]
    fn test_fit_rejects_too_many_components() {
        let (dates, assets, values) = factor_returns(30, 4);
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();
        assert!(matches!(
            FactorModel::fit(&window, 5),
            Err(FaroError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_constant_column_gets_unit_scale() {
        let (dates, assets, mut values) = factor_returns(40, 4);
        values.column_mut(3).fill(0.001);
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();

        let model = FactorModel::fit(&window, 2).unwrap();
        assert_abs_diff_eq!(model.scale()[3], 1.0);
        assert!(model.explained_variance().sum() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_unfitted_operations_fail() {
        let decomposer = FactorDecomposer::new(2).unwrap();
        let (dates, assets, values) = factor_returns(10, 3);
        let window = ReturnWindow::new(&dates, &assets, values.view()).unwrap();

        assert!(matches!(decomposer.transform(&window), Err(FaroError::NotFitted(_))));
        assert!(matches!(decomposer.loadings(), Err(FaroError::NotFitted(_))));
        assert!(matches!(
            decomposer.explained_variance(),
            Err(FaroError::NotFitted(_))
        ));
        assert!(FactorDecomposer::new(0).is_err());
    }

    #[test]
    fn test_transform_rejects_other_assets() {
        let (returns, decomposer) = fitted(40, 4, 2);
        let window = returns.window(0..40).unwrap();
        let other: Vec<Symbol> = vec!["X".into(), "Y".into(), "Z".into(), "W".into()];
        let foreign = ReturnWindow::new(window.dates(), &other, window.values()).unwrap();

        assert!(decomposer.transform(&foreign).is_err());
    }
}
