//! Statistical utility functions.
//!
//! Moments and quantiles shared by the decomposition (standardization,
//! factor dispersion) and the backtest (regime thresholds).

use crate::error::{FaroError, Result};

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
///
/// `ddof = 1` gives the sample (Bessel-corrected) estimate, `ddof = 0` the
/// population one. Returns NaN when `values.len() <= ddof`.
///
/// # Examples
///
/// ```
/// use faro_traits::stats::std_dev;
///
/// let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((std_dev(&values, 0) - 2.0).abs() < 1e-12);
/// ```
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return f64::NAN;
    }

    let m = mean(values);
    let ss = values.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    (ss / (n - ddof) as f64).sqrt()
}

/// Quantile with linear interpolation between order statistics.
///
/// For sorted values `x[0..n]` and position `p = q * (n - 1)`, returns
/// `x[floor(p)] + (p - floor(p)) * (x[ceil(p)] - x[floor(p)])`.
///
/// # Errors
///
/// Returns [`FaroError::InvalidConfig`] if `q` is outside `[0, 1]` and
/// [`FaroError::InvalidData`] if `values` is empty or holds non-finite values.
///
/// # Examples
///
/// ```
/// use faro_traits::stats::quantile;
///
/// let q = quantile(&[4.0, 1.0, 3.0, 2.0], 0.75).unwrap();
/// assert!((q - 3.25).abs() < 1e-12);
/// ```
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(FaroError::InvalidConfig(format!(
            "quantile {q} outside [0, 1]"
        )));
    }
    if values.is_empty() {
        return Err(FaroError::InvalidData(
            "cannot take a quantile of an empty series".to_string(),
        ));
    }
    if values.iter().any(|x| !x.is_finite()) {
        return Err(FaroError::InvalidData(
            "cannot take a quantile of a series with non-finite values".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_basic() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_std_dev_sample_vs_population() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(std_dev(&values, 1), 2.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(std_dev(&values, 0), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_std_dev_too_short() {
        assert!(std_dev(&[42.0], 1).is_nan());
        assert_relative_eq!(std_dev(&[42.0], 0), 0.0);
    }

    #[test]
    fn test_quantile_endpoints() {
        let values = [3.0, 1.0, 2.0];
        assert_relative_eq!(quantile(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&values, 1.0).unwrap(), 3.0);
        assert_relative_eq!(quantile(&values, 0.5).unwrap(), 2.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        // position 0.75 * 9 = 6.75 -> 7 + 0.75 * (8 - 7)
        assert_relative_eq!(quantile(&values, 0.75).unwrap(), 7.75, epsilon = 1e-12);
    }

    #[test]
    fn test_quantile_single_value() {
        assert_relative_eq!(quantile(&[0.3], 0.9).unwrap(), 0.3);
    }

    #[test]
    fn test_quantile_rejects_bad_input() {
        assert!(matches!(
            quantile(&[1.0, 2.0], 1.5),
            Err(FaroError::InvalidConfig(_))
        ));
        assert!(matches!(quantile(&[], 0.5), Err(FaroError::InvalidData(_))));
        assert!(matches!(
            quantile(&[1.0, f64::NAN], 0.5),
            Err(FaroError::InvalidData(_))
        ));
    }
}
