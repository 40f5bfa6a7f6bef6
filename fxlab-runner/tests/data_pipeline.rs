//! Files on disk through to a scored backtest: config TOML, bars CSV and
//! calendar CSV loaded from a temp dir, then run through `backtest`.

use std::fmt::Write as _;
use std::fs;

use chrono::{Duration, TimeZone, Utc};
use fxlab_core::domain::{ParameterSet, Side, Timeframe};
use fxlab_runner::{backtest, load_bars, load_calendar, LabConfig, LoadError};

const PIP: f64 = 0.0001;

/// Engulfing-pair history written as CSV, drifting up 3 pips per pair.
fn trending_csv(pairs: usize) -> String {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    let mut c = 1.1000;
    for k in 0..pairs {
        let rows = [
            (c - PIP, c - 0.5 * PIP, c - 3.5 * PIP, c - 3.0 * PIP),
            (c - 4.0 * PIP, c + 3.5 * PIP, c - 4.5 * PIP, c + 3.0 * PIP),
        ];
        for (j, (o, h, l, cl)) in rows.into_iter().enumerate() {
            let ts = start + Duration::minutes(15 * (2 * k + j) as i64);
            writeln!(out, "{},{o},{h},{l},{cl},1000", ts.format("%Y-%m-%d %H:%M:%S")).unwrap();
        }
        c += 3.0 * PIP;
    }
    out
}

fn params() -> ParameterSet {
    ParameterSet {
        ema_fast: 3,
        ema_slow: 8,
        rsi_period: 14,
        rsi_hi: 80.0,
        rsi_lo: 20.0,
        atr_sl_mult: 3.0,
        atr_tp_mult: 0.5,
        ml_n_estimators: 10,
        ml_enabled: false,
    }
}

#[test]
fn files_to_scored_backtest() {
    let dir = tempfile::tempdir().unwrap();
    let bars_path = dir.path().join("eurusd_m15.csv");
    let config_path = dir.path().join("fxlab.toml");
    fs::write(&bars_path, trending_csv(200)).unwrap();
    fs::write(&config_path, "[signal]\nhtf_ema_period = 3\n").unwrap();

    let config = LabConfig::from_file(&config_path).unwrap();
    let loaded = load_bars(&bars_path, Timeframe::M15).unwrap();
    assert_eq!(loaded.bars.len(), 400);
    assert_eq!(loaded.dataset_hash.len(), 64);

    let report = backtest(&params(), &loaded.bars, &config.engine_config(), None).unwrap();
    assert_eq!(report.run.equity_curve.len(), 400);
    assert!(!report.run.trades.is_empty());
    assert!(report.run.trades.iter().all(|t| t.side == Side::Long));
    assert_eq!(report.metrics.trade_count, report.run.trades.len());
    assert!(report.metrics.net_profit_pct > 0.0);
}

#[test]
fn same_file_same_hash_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.csv");
    fs::write(&path, trending_csv(120)).unwrap();

    let a = load_bars(&path, Timeframe::M15).unwrap();
    let b = load_bars(&path, Timeframe::M15).unwrap();
    assert_eq!(a.dataset_hash, b.dataset_hash);

    let mut config = LabConfig::default();
    config.signal.htf_ema_period = 3;
    let engine = config.engine_config();
    let ra = backtest(&params(), &a.bars, &engine, None).unwrap();
    let rb = backtest(&params(), &b.bars, &engine, None).unwrap();
    assert_eq!(ra.run.trades, rb.run.trades);
    assert_eq!(ra.metrics, rb.metrics);
    assert_eq!(ra.reward, rb.reward);
}

#[test]
fn calendar_file_loads_for_the_pair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.csv");
    fs::write(
        &path,
        "timestamp,currency,impact\n\
         2024-03-05 13:30,usd,High\n\
         2024-03-06T09:00:00Z,EUR,medium\n\
         2024-03-07 08:00:00,JPY,high\n",
    )
    .unwrap();

    let config = LabConfig::default();
    assert!(load_calendar(&path, &config.instrument).is_ok());
}

#[test]
fn unordered_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.csv");
    fs::write(
        &path,
        "timestamp,open,high,low,close,volume\n\
         2024-03-04 00:15,1.1,1.1002,1.0998,1.1001,10\n\
         2024-03-04 00:00,1.1,1.1002,1.0998,1.1001,10\n",
    )
    .unwrap();
    let err = load_bars(&path, Timeframe::M15).unwrap_err();
    assert!(matches!(err, LoadError::Data(_)), "{err}");
}
