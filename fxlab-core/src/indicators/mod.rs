//! Indicator implementations.
//!
//! Every indicator implements `Indicator`: a causal function from a bar
//! slice to one value per bar, NaN during its warm-up. Each output at index
//! `t` depends on `bars[..=t]` only. They are precomputed once per backtest
//! and read per bar by the signal engine.

pub mod atr;
pub mod ema;
pub mod engulfing;
pub mod htf_bias;
pub mod rsi;
pub mod window;

pub use atr::Atr;
pub use ema::{ema_of_series, Ema, EmaState};
pub use engulfing::{engulfing, pattern_side, Engulfing};
pub use htf_bias::HigherTimeframeBias;
pub use rsi::{Rsi, RsiState};
pub use window::RollingWindow;

use crate::domain::Bar;

/// A single-series technical indicator.
pub trait Indicator: Send + Sync {
    /// Unique name, e.g. "ema_20".
    fn name(&self) -> &str;

    /// Bars needed before the first non-NaN value.
    fn lookback(&self) -> usize;

    /// Full series, same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic M15 bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 0.0002, low = min(open,close) - 0.0002.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 0.0002, open.min(close) - 0.0002, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create synthetic M15 bars from (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::TimeZone;
    let start = chrono::Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: start + chrono::Duration::minutes(15 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
            timeframe: crate::domain::Timeframe::M15,
            spread: None,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
