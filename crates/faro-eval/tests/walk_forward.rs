//! End-to-end walk-forward runs on synthetic data.

use approx::assert_relative_eq;
use faro_data::SyntheticReturns;
use faro_eval::{BacktestConfig, CalibrationPolicy, RollingRegimeBacktester};
use faro_pca::FactorModel;
use faro_portfolio::AllocationEngine;
use faro_traits::{FactorId, FaroError, ReturnMatrix, stats};

fn synthetic(n_assets: usize, n_rows: usize) -> ReturnMatrix {
    SyntheticReturns::new(n_assets, n_rows, 42).generate().unwrap()
}

fn config() -> BacktestConfig {
    BacktestConfig {
        window: 100,
        n_components: 3,
        target_factor: FactorId::SECOND,
        risk_scale_high_vol: 0.5,
        vol_threshold_quantile: 0.75,
        ..Default::default()
    }
}

fn truncate(returns: &ReturnMatrix, rows: usize) -> ReturnMatrix {
    ReturnMatrix::new(
        returns.dates()[..rows].to_vec(),
        returns.assets().to_vec(),
        returns.values().slice(ndarray::s![..rows, ..]).to_owned(),
    )
    .unwrap()
}

#[test]
fn ten_assets_five_hundred_rows() {
    let returns = synthetic(10, 500);
    let result = RollingRegimeBacktester::new(config()).run(&returns).unwrap();

    assert_eq!(result.len(), 399);
    assert!(result.regime_threshold().is_finite());
    assert!(result.high_vol_count() > 0);

    for record in result.records() {
        let gross = record.weights.gross_exposure();
        let expected = if record.high_vol { 0.5 } else { 1.0 };
        assert!(
            (gross - expected).abs() < 1e-9,
            "gross exposure {gross} on {}",
            record.date
        );
        assert_eq!(record.threshold, result.regime_threshold());
    }
}

#[test]
fn series_share_the_shifted_date_index() {
    let returns = synthetic(10, 500);
    let result = RollingRegimeBacktester::new(config()).run(&returns).unwrap();

    assert_eq!(result.dates(), returns.dates()[101..].to_vec());
    assert_eq!(result.portfolio_returns().len(), result.len());
    assert_eq!(result.leading_factor_vol().len(), result.len());
    assert_eq!(result.weight_history().dim(), (result.len(), 10));
}

#[test]
fn each_step_matches_an_independent_fit() {
    let returns = synthetic(10, 300);
    let cfg = config();
    let result = RollingRegimeBacktester::new(cfg.clone()).run(&returns).unwrap();

    let mut scaled = 0;
    for (step, record) in result.records().iter().enumerate() {
        let t = cfg.window + step;
        let window = returns.window(t - cfg.window..t).unwrap();
        let model = FactorModel::fit(&window, cfg.n_components).unwrap();
        let unscaled = AllocationEngine::new(&window, model.loadings(), cfg.target_factor)
            .unwrap()
            .evaluation_weights()
            .unwrap();
        let vol = model
            .transform(&window)
            .unwrap()
            .std(FactorId::LEADING)
            .unwrap();

        assert_eq!(record.leading_factor_vol, vol);
        assert_eq!(record.high_vol, vol > result.regime_threshold());
        if record.high_vol {
            assert_eq!(record.weights, unscaled.scaled(cfg.risk_scale_high_vol));
            scaled += 1;
        } else {
            assert_eq!(record.weights, unscaled);
        }

        let next = returns.row(t + 1).unwrap();
        assert_relative_eq!(
            record.portfolio_return,
            record.weights.view().dot(&next),
            epsilon = 1e-15
        );
    }
    assert!(scaled > 0);
}

#[test]
fn weights_never_depend_on_later_rows() {
    let returns = synthetic(10, 400);
    let cfg = BacktestConfig {
        risk_scale_high_vol: 1.0,
        ..config()
    };
    let backtester = RollingRegimeBacktester::new(cfg);

    let full = backtester.run(&returns).unwrap();
    let prefix = backtester.run(&truncate(&returns, 250)).unwrap();

    assert_eq!(prefix.len(), 149);
    for (a, b) in prefix.records().iter().zip(full.records()) {
        assert_eq!(a.date, b.date);
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.portfolio_return, b.portfolio_return);
        assert_eq!(a.leading_factor_vol, b.leading_factor_vol);
    }
}

#[test]
fn trailing_calibration_uses_only_past_volatility() {
    let returns = synthetic(10, 400);
    let cfg = BacktestConfig {
        calibration: CalibrationPolicy::expanding(20),
        ..config()
    };
    let backtester = RollingRegimeBacktester::new(cfg.clone());
    let result = backtester.run(&returns).unwrap();

    let vols = result.leading_factor_vol();
    for (k, record) in result.records().iter().enumerate() {
        if k < 19 {
            assert_eq!(record.threshold, f64::INFINITY);
            assert!(!record.high_vol);
        } else {
            let expected = stats::quantile(&vols[..=k], cfg.vol_threshold_quantile).unwrap();
            assert_relative_eq!(record.threshold, expected);
            assert_eq!(record.high_vol, record.leading_factor_vol > record.threshold);
        }
    }

    // With regime scaling active the whole record is still prefix-stable.
    let prefix = backtester.run(&truncate(&returns, 250)).unwrap();
    for (a, b) in prefix.records().iter().zip(result.records()) {
        assert_eq!(a, b);
    }
}

#[test]
fn parallel_matches_serial() {
    let returns = synthetic(8, 260);
    let serial = RollingRegimeBacktester::new(config()).run(&returns).unwrap();
    let parallel = RollingRegimeBacktester::new(BacktestConfig {
        parallel: true,
        ..config()
    })
    .run(&returns)
    .unwrap();

    assert_eq!(serial.records(), parallel.records());
    assert_eq!(serial.regime_threshold(), parallel.regime_threshold());
}

#[test]
fn window_shorter_than_universe_fails_before_any_weight() {
    let returns = synthetic(10, 200);
    let cfg = BacktestConfig {
        window: 8,
        ..config()
    };
    let err = RollingRegimeBacktester::new(cfg).run(&returns).unwrap_err();
    assert!(matches!(err, FaroError::NotEnoughData(_)));

    let window = returns.window(0..8).unwrap();
    assert!(matches!(
        FactorModel::fit(&window, 3),
        Err(FaroError::NotEnoughData(_))
    ));
}

#[test]
fn too_short_history_fails() {
    let returns = synthetic(10, 101);
    let err = RollingRegimeBacktester::new(config()).run(&returns).unwrap_err();
    assert!(matches!(
        err,
        FaroError::InsufficientHistory {
            rows: 101,
            window: 100
        }
    ));

    let returns = synthetic(10, 102);
    assert_eq!(
        RollingRegimeBacktester::new(config())
            .run(&returns)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn target_outside_kept_factors_is_rejected() {
    let returns = synthetic(10, 200);
    let cfg = BacktestConfig {
        target_factor: FactorId::new(3),
        ..config()
    };
    assert!(matches!(
        RollingRegimeBacktester::new(cfg).run(&returns),
        Err(FaroError::InvalidConfig(_))
    ));
}

#[test]
fn result_frame_has_one_column_per_asset() {
    let returns = synthetic(5, 160);
    let cfg = BacktestConfig {
        window: 60,
        ..config()
    };
    let result = RollingRegimeBacktester::new(cfg).run(&returns).unwrap();
    let df = result.to_dataframe().unwrap();

    assert_eq!(df.height(), 99);
    assert_eq!(df.width(), 5 + 5);
    for asset in returns.assets() {
        assert!(df.column(asset).is_ok());
    }
}
