//! Regime-threshold calibration.
//!
//! A step is in a high-volatility regime when its leading-factor volatility
//! exceeds the threshold in force at that step. How the threshold is
//! computed from the volatility history is pluggable through
//! [`RegimeCalibrator`].

use std::fmt;

use faro_traits::{FaroError, Result, stats};
use serde::{Deserialize, Serialize};

/// Maps a leading-factor volatility series to per-step regime thresholds.
pub trait RegimeCalibrator: fmt::Debug + Send + Sync {
    /// Short policy name for logging.
    fn name(&self) -> &str;

    /// One threshold per entry of `vols`, at quantile `q`.
    ///
    /// # Errors
    ///
    /// Propagates quantile errors (empty or non-finite input).
    fn thresholds(&self, vols: &[f64], q: f64) -> Result<Vec<f64>>;
}

/// Built-in calibration policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CalibrationPolicy {
    /// One quantile over the entire volatility series, applied at every step.
    ///
    /// Every step's threshold depends on volatility observed after it.
    #[default]
    Global,
    /// Quantile over volatilities observed up to and including each step.
    Trailing {
        /// Trailing observations to use; `None` is an expanding window.
        #[serde(default)]
        lookback: Option<usize>,
        /// Steps with fewer observations are never flagged.
        #[serde(default = "default_min_periods")]
        min_periods: usize,
    },
}

const fn default_min_periods() -> usize {
    20
}

impl CalibrationPolicy {
    /// Expanding trailing calibration.
    pub const fn expanding(min_periods: usize) -> Self {
        Self::Trailing {
            lookback: None,
            min_periods,
        }
    }

    /// Check policy parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FaroError::InvalidConfig`] if `min_periods` is zero or the
    /// lookback is shorter than `min_periods`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Global => Ok(()),
            Self::Trailing {
                lookback,
                min_periods,
            } => {
                if min_periods == 0 {
                    return Err(FaroError::InvalidConfig(
                        "trailing calibration needs min_periods >= 1".to_string(),
                    ));
                }
                if let Some(lookback) = lookback.filter(|&l| l < min_periods) {
                    return Err(FaroError::InvalidConfig(format!(
                        "lookback {lookback} is shorter than min_periods {min_periods}"
                    )));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for CalibrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Trailing {
                lookback: None,
                min_periods,
            } => write!(f, "trailing(expanding, min {min_periods})"),
            Self::Trailing {
                lookback: Some(lookback),
                min_periods,
            } => write!(f, "trailing({lookback}, min {min_periods})"),
        }
    }
}

impl RegimeCalibrator for CalibrationPolicy {
    fn name(&self) -> &str {
        match self {
            Self::Global => "global",
            Self::Trailing { .. } => "trailing",
        }
    }

    fn thresholds(&self, vols: &[f64], q: f64) -> Result<Vec<f64>> {
        match *self {
            Self::Global => {
                let threshold = stats::quantile(vols, q)?;
                Ok(vec![threshold; vols.len()])
            }
            Self::Trailing {
                lookback,
                min_periods,
            } => (0..vols.len())
                .map(|i| {
                    let start = lookback.map_or(0, |l| (i + 1).saturating_sub(l));
                    let seen = &vols[start..=i];
                    if seen.len() < min_periods {
                        Ok(f64::INFINITY)
                    } else {
                        stats::quantile(seen, q)
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vols() -> Vec<f64> {
        vec![0.1, 0.3, 0.2, 0.5, 0.4, 0.9, 0.6]
    }

    #[test]
    fn test_global_is_one_full_sample_quantile() {
        let thresholds = CalibrationPolicy::Global.thresholds(&vols(), 0.5).unwrap();
        assert_eq!(thresholds.len(), 7);
        assert!(thresholds.iter().all(|&t| t == 0.4));
    }

    #[test]
    fn test_trailing_only_sees_the_past() {
        let policy = CalibrationPolicy::expanding(2);
        let base = policy.thresholds(&vols(), 1.0).unwrap();

        assert_eq!(base[0], f64::INFINITY);
        assert_relative_eq!(base[1], 0.3);
        assert_relative_eq!(base[4], 0.5);

        let mut shocked = vols();
        shocked[5] = 10.0;
        let after = policy.thresholds(&shocked, 1.0).unwrap();
        assert_eq!(&after[..5], &base[..5]);
        assert_relative_eq!(after[5], 10.0);
    }

    #[test]
    fn test_trailing_lookback_rolls() {
        let policy = CalibrationPolicy::Trailing {
            lookback: Some(2),
            min_periods: 2,
        };
        let thresholds = policy.thresholds(&vols(), 0.0).unwrap();
        assert_relative_eq!(thresholds[3], 0.2);
        assert_relative_eq!(thresholds[6], 0.6);
    }

    #[test]
    fn test_expanding_at_last_step_matches_global() {
        let q = 0.75;
        let global = CalibrationPolicy::Global.thresholds(&vols(), q).unwrap();
        let expanding = CalibrationPolicy::expanding(1).thresholds(&vols(), q).unwrap();
        assert_relative_eq!(expanding[6], global[6]);
    }

    #[test]
    fn test_validate() {
        assert!(CalibrationPolicy::Global.validate().is_ok());
        assert!(CalibrationPolicy::expanding(0).validate().is_err());
        let short = CalibrationPolicy::Trailing {
            lookback: Some(5),
            min_periods: 10,
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_serde_tagging() {
        let policy: CalibrationPolicy =
            serde_json::from_str(r#"{"policy": "trailing", "lookback": 60}"#).unwrap();
        assert_eq!(
            policy,
            CalibrationPolicy::Trailing {
                lookback: Some(60),
                min_periods: 20
            }
        );
        let global: CalibrationPolicy = serde_json::from_str(r#"{"policy": "global"}"#).unwrap();
        assert_eq!(global, CalibrationPolicy::Global);
    }
}
