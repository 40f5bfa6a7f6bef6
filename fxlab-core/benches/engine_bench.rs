//! Criterion benchmarks for fxlab hot paths.
//!
//! Benchmarks:
//! 1. Bar event loop (full backtest, ML off and on)
//! 2. Signal engine (indicators plus feature rows)
//! 3. Indicator batch (EMA, RSI, ATR, H4 bias)

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fxlab_core::domain::{Bar, ParameterSet, Timeframe};
use fxlab_core::engine::{run_backtest, EngineConfig};
use fxlab_core::features::{SignalConfig, SignalEngine};
use fxlab_core::indicators::{Atr, Ema, HigherTimeframeBias, Indicator, Rsi};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let x = i as f64;
            let close = 1.10 + (x * 0.05).sin() * 0.004 + (x * 0.013).cos() * 0.002;
            let open = close - (x * 0.7).sin() * 0.0003;
            Bar {
                timestamp: start + Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 0.0004,
                low: open.min(close) - 0.0004,
                close,
                volume: 1_000.0,
                timeframe: Timeframe::M15,
                spread: None,
            }
        })
        .collect()
}

// ── 1. Bar event loop ────────────────────────────────────────────────

fn bench_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest");
    let config = EngineConfig::default();
    for &n in &[2_000usize, 10_000] {
        let bars = make_bars(n);
        for ml_enabled in [false, true] {
            let params = ParameterSet {
                ml_enabled,
                ..ParameterSet::default()
            };
            let label = if ml_enabled { "ml" } else { "rules" };
            group.bench_with_input(BenchmarkId::new(label, n), &bars, |b, bars| {
                b.iter(|| run_backtest(black_box(bars), &params, &config, None))
            });
        }
    }
    group.finish();
}

// ── 2. Signal engine ─────────────────────────────────────────────────

fn bench_signals(c: &mut Criterion) {
    let bars = make_bars(10_000);
    let config = SignalConfig::default();
    let params = ParameterSet::default();
    c.bench_function("signal_engine_10k", |b| {
        b.iter(|| SignalEngine::compute(black_box(&bars), &params, &config))
    });
}

// ── 3. Indicator batch ───────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let bars = make_bars(10_000);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Ema::new(10)),
        Box::new(Ema::new(50)),
        Box::new(Rsi::new(14)),
        Box::new(Atr::new(14)),
        Box::new(HigherTimeframeBias::new(10, Timeframe::H4, Timeframe::M15)),
    ];
    c.bench_function("indicator_batch_10k", |b| {
        b.iter(|| {
            indicators
                .iter()
                .map(|ind| ind.compute(black_box(&bars)))
                .collect::<Vec<_>>()
        })
    });
}

criterion_group!(benches, bench_backtest, bench_signals, bench_indicators);
criterion_main!(benches);
