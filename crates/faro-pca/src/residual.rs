//! Factor neutralization.
//!
//! Removes the part of each asset's return explained by the dominant
//! factors, leaving the idiosyncratic residual.

use faro_traits::{FaroError, Result, ReturnMatrix, ReturnWindow};

use crate::decomposer::FactorModel;

/// Subtract the reconstruction from the first `n_components` factors.
///
/// The window is projected with the model's fit-time standardization, the
/// first `n_components` factors are mapped back to asset space, and the
/// result is subtracted from the observed returns.
///
/// # Errors
///
/// - [`FaroError::InvalidData`] if the window's assets differ from the model's.
/// - [`FaroError::InvalidConfig`] if `n_components` is zero or exceeds the
///   model's factors.
pub fn neutralize_factors(
    model: &FactorModel,
    window: &ReturnWindow<'_>,
    n_components: usize,
) -> Result<ReturnMatrix> {
    let factors = model.transform(window)?;
    let reconstructed = model.reconstruct(&factors, Some(n_components))?;

    let residuals = &window.values() - reconstructed.values();
    if residuals.iter().any(|x| !x.is_finite()) {
        return Err(FaroError::InvalidData(
            "neutralization produced non-finite residuals".to_string(),
        ));
    }

    ReturnMatrix::new(window.dates().to_vec(), window.assets().to_vec(), residuals)
}

/// Residual signal after removing the dominant factors.
///
/// Defaults to neutralizing the leading factor only, which strips the
/// market-wide move and leaves relative performance.
///
/// # Errors
///
/// See [`neutralize_factors`].
pub fn extract_residual_signal(
    model: &FactorModel,
    window: &ReturnWindow<'_>,
    n_components: Option<usize>,
) -> Result<ReturnMatrix> {
    neutralize_factors(model, window, n_components.unwrap_or(1))
}
