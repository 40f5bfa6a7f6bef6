//! Higher-timeframe trend bias.
//!
//! Base bars are grouped into fixed UTC blocks (4 hours by default). When a
//! block completes, its last close is fed into an EMA of block closes. The
//! bias seen by a bar comes only from blocks that completed before the bar's
//! own block opened, so a partially formed block never leaks forward.
//!
//! Encoded as +1 (close above EMA), -1 (below), 0 (equal), NaN (warming up).
//! Lookback: period × base bars per block.

use super::ema::EmaState;
use super::Indicator;
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Clone)]
pub struct HigherTimeframeBias {
    period: usize,
    block: Timeframe,
    base: Timeframe,
    name: String,
}

impl HigherTimeframeBias {
    pub fn new(period: usize, block: Timeframe, base: Timeframe) -> Self {
        assert!(period >= 1, "bias EMA period must be >= 1");
        Self {
            period,
            block,
            base,
            name: format!("htf_bias_{:?}_{period}", block).to_lowercase(),
        }
    }

    fn bars_per_block(&self) -> usize {
        (self.block.minutes() / self.base.minutes()).max(1) as usize
    }
}

impl Indicator for HigherTimeframeBias {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period * self.bars_per_block()
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let block_secs = self.block.minutes() * 60;
        let mut ema = EmaState::new(self.period);
        let mut result = vec![f64::NAN; bars.len()];
        let mut current_block: Option<i64> = None;
        let mut last_close = f64::NAN;
        let mut bias = f64::NAN;

        for (i, bar) in bars.iter().enumerate() {
            let block = bar.timestamp.timestamp().div_euclid(block_secs);
            if current_block.is_some_and(|b| b != block) {
                let avg = ema.update(last_close);
                bias = if avg.is_nan() {
                    f64::NAN
                } else if last_close > avg {
                    1.0
                } else if last_close < avg {
                    -1.0
                } else {
                    0.0
                };
            }
            current_block = Some(block);
            last_close = bar.close;
            result[i] = bias;
        }
        result
    }
}
