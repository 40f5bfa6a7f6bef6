//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and losses over close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seed: plain mean of the first `period` changes. Lookback: period.
//! Edge cases: no movement → 50; avg_loss == 0 → 100; avg_gain == 0 → 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut state = RsiState::new(self.period);
        bars.iter().map(|b| state.update(b.close)).collect()
    }
}

/// Incremental RSI over a stream of closes.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    prev_close: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
    tainted: bool,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            tainted: false,
        }
    }

    pub fn update(&mut self, close: f64) -> f64 {
        if self.tainted || close.is_nan() {
            self.tainted = true;
            return f64::NAN;
        }
        let Some(prev) = self.prev_close.replace(close) else {
            return f64::NAN;
        };

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        self.changes += 1;

        if self.changes <= self.period {
            self.avg_gain += gain;
            self.avg_loss += loss;
            if self.changes < self.period {
                return f64::NAN;
            }
            self.avg_gain /= self.period as f64;
            self.avg_loss /= self.period as f64;
        } else {
            let alpha = 1.0 / self.period as f64;
            self.avg_gain = alpha * gain + (1.0 - alpha) * self.avg_gain;
            self.avg_loss = alpha * loss + (1.0 - alpha) * self.avg_loss;
        }
        compute_rsi(self.avg_gain, self.avg_loss)
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
