//! Price to return conversion.

use faro_traits::{FaroError, Result, ReturnMatrix};
use ndarray::{Array2, s};

use crate::loader::PriceFrame;

/// Log returns `ln(p_t / p_{t-1})`, dated at `t`.
///
/// The first date has no predecessor and is dropped.
///
/// # Errors
///
/// - [`FaroError::NotEnoughData`] with fewer than two dates.
/// - [`FaroError::InvalidData`] if any price is non-positive or non-finite.
pub fn compute_log_returns(prices: &PriceFrame) -> Result<ReturnMatrix> {
    if prices.len() < 2 {
        return Err(FaroError::NotEnoughData(format!(
            "need at least 2 price rows, got {}",
            prices.len()
        )));
    }

    let values = prices.values();
    if let Some(bad) = values.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
        return Err(FaroError::InvalidData(format!(
            "prices must be strictly positive, found {bad}"
        )));
    }

    let current = values.slice(s![1.., ..]);
    let previous = values.slice(s![..-1, ..]);
    let mut returns = Array2::zeros(current.raw_dim());
    ndarray::Zip::from(&mut returns)
        .and(&current)
        .and(&previous)
        .for_each(|r, &p, &q| *r = (p / q).ln());

    ReturnMatrix::new(
        prices.dates()[1..].to_vec(),
        prices.assets().to_vec(),
        returns,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use faro_traits::Date;
    use ndarray::array;

    fn frame(values: Array2<f64>) -> PriceFrame {
        let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.nrows())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        let assets = (0..values.ncols()).map(|j| format!("T{j}")).collect();
        PriceFrame::new(dates, assets, values).unwrap()
    }

    #[test]
    fn test_log_returns() {
        let prices = frame(array![[100.0, 50.0], [110.0, 50.0], [99.0, 55.0]]);
        let returns = compute_log_returns(&prices).unwrap();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.dates()[0], prices.dates()[1]);
        assert_relative_eq!(returns.values()[[0, 0]], (1.1f64).ln());
        assert_relative_eq!(returns.values()[[0, 1]], 0.0);
        assert_relative_eq!(returns.values()[[1, 0]], (0.9f64).ln());
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        let prices = frame(array![[100.0, 50.0], [0.0, 51.0]]);
        assert!(matches!(
            compute_log_returns(&prices),
            Err(FaroError::InvalidData(_))
        ));
    }

    #[test]
    fn test_single_row() {
        let prices = frame(array![[100.0, 50.0]]);
        assert!(matches!(
            compute_log_returns(&prices),
            Err(FaroError::NotEnoughData(_))
        ));
    }
}
