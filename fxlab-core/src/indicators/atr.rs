//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the simple rolling mean of TR over a fixed window, kept in a ring
//! buffer so each bar costs O(1).
//! Lookback: period (the first bar has no previous close).

use super::window::RollingWindow;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range of `bar` given the previous close.
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    let (h, l) = (bar.high, bar.low);
    // f64::max would silently drop a NaN operand
    if h.is_nan() || l.is_nan() || prev_close.is_nan() {
        return f64::NAN;
    }
    (h - l).max((h - prev_close).abs()).max((l - prev_close).abs())
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        let mut window = RollingWindow::new(self.period);
        for i in 1..bars.len() {
            let tr = true_range(&bars[i], bars[i - 1].close);
            if tr.is_nan() {
                // NaN poisons every later window
                return result;
            }
            window.push(tr);
            result[i] = window.mean();
        }
        result
    }
}
