//! Feature/signal engine.
//!
//! Turns a bar history plus a parameter set into one `SignalVector` per bar.
//! Every field at index `t` is computed from `bars[..=t]` only:
//! - indicators are causal (see `indicators`);
//! - the higher-timeframe bias only reads completed blocks;
//! - the ML filter is trained on rows whose labels resolve inside the
//!   training window and is only consulted after that window closes.
//!
//! Evaluating a prefix of the history therefore yields a prefix of the
//! full-history signals.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Bar, ParameterSet, Side, Timeframe};
use crate::error::DataError;
use crate::indicators::{
    pattern_side, Atr, Ema, Engulfing, HigherTimeframeBias, Indicator, Rsi,
};
use crate::ml::{Dataset, MlConfig, ProbabilityFilter, N_FEATURES, NEUTRAL_PROBABILITY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub atr_period: usize,
    pub htf_ema_period: usize,
    pub htf_block: Timeframe,
    pub ml: MlConfig,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            htf_ema_period: 10,
            htf_block: Timeframe::H4,
            ml: MlConfig::default(),
        }
    }
}

/// Everything the decision logic sees about one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalVector {
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub rsi: f64,
    pub atr: f64,
    pub pattern: Option<Side>,
    /// `None` while warming up or when the block close sits on its average.
    pub htf_bias: Option<Side>,
    /// P(up) from the ML filter; 0.5 when no model applies.
    pub ml_probability: f64,
}

impl SignalVector {
    /// All numeric inputs are available.
    pub fn is_ready(&self) -> bool {
        self.fast_ma.is_finite()
            && self.slow_ma.is_finite()
            && self.rsi.is_finite()
            && self.atr.is_finite()
            && self.ml_probability.is_finite()
    }

    /// Direction of the fast average relative to the slow one.
    pub fn ma_direction(&self) -> Option<Side> {
        if self.fast_ma > self.slow_ma {
            Some(Side::Long)
        } else if self.fast_ma < self.slow_ma {
            Some(Side::Short)
        } else {
            None
        }
    }

    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SignalSeries {
    vectors: Vec<SignalVector>,
    warmup: usize,
    ml_active_from: Option<usize>,
}

impl SignalSeries {
    pub fn get(&self, index: usize) -> Option<&SignalVector> {
        self.vectors.get(index)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[SignalVector] {
        &self.vectors
    }

    /// Minimum history length the parameters require.
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// First bar that reads a trained model, if one was trained.
    pub fn ml_active_from(&self) -> Option<usize> {
        self.ml_active_from
    }
}

/// Bars required before the first decision and its next-bar fill.
pub fn warmup_bars(params: &ParameterSet, config: &SignalConfig) -> usize {
    params
        .ema_slow
        .max(params.rsi_period + 1)
        .max(config.atr_period + 1)
        + 1
}

fn bias_side(encoded: f64) -> Option<Side> {
    pattern_side(encoded)
}

/// Stateless entry point; see the module docs for the look-ahead contract.
pub struct SignalEngine;

impl SignalEngine {
    pub fn compute(
        bars: &[Bar],
        params: &ParameterSet,
        config: &SignalConfig,
    ) -> Result<SignalSeries, DataError> {
        let need = warmup_bars(params, config);
        if bars.is_empty() {
            return Err(DataError::Empty);
        }
        if bars.len() < need {
            return Err(DataError::InsufficientHistory {
                have: bars.len(),
                need,
            });
        }

        let base = bars[0].timeframe;
        let fast = Ema::new(params.ema_fast).compute(bars);
        let slow = Ema::new(params.ema_slow).compute(bars);
        let rsi = Rsi::new(params.rsi_period).compute(bars);
        let atr = Atr::new(config.atr_period).compute(bars);
        let pattern = Engulfing.compute(bars);
        let bias = HigherTimeframeBias::new(config.htf_ema_period, config.htf_block, base)
            .compute(bars);

        let mut vectors: Vec<SignalVector> = (0..bars.len())
            .map(|t| SignalVector {
                fast_ma: fast[t],
                slow_ma: slow[t],
                rsi: rsi[t],
                atr: atr[t],
                pattern: pattern_side(pattern[t]),
                htf_bias: bias_side(bias[t]),
                ml_probability: NEUTRAL_PROBABILITY,
            })
            .collect();

        let mut ml_active_from = None;
        if params.ml_enabled && bars.len() > config.ml.train_bars {
            let filter = train_filter(bars, &vectors, params, &config.ml);
            if filter.is_trained() {
                let start = config.ml.train_bars;
                for t in start..bars.len() {
                    let row = feature_row(bars, &vectors, t);
                    vectors[t].ml_probability = filter.predict_probability(&row);
                }
                ml_active_from = Some(start);
            }
        }

        Ok(SignalSeries {
            vectors,
            warmup: need,
            ml_active_from,
        })
    }
}

/// Engineered feature row for bar `t`; NaN entries while warming up.
pub fn feature_row(bars: &[Bar], vectors: &[SignalVector], t: usize) -> [f64; N_FEATURES] {
    let v = &vectors[t];
    let one_bar_return = if t == 0 {
        f64::NAN
    } else {
        bars[t].close - bars[t - 1].close
    };
    let side_code = |s: Option<Side>| s.map_or(0.0, Side::sign);
    [
        (v.fast_ma - v.slow_ma) / v.atr,
        v.rsi / 100.0,
        side_code(v.pattern),
        v.atr / bars[t].close,
        one_bar_return / v.atr,
        side_code(v.htf_bias),
    ]
}

fn train_filter(
    bars: &[Bar],
    vectors: &[SignalVector],
    params: &ParameterSet,
    config: &MlConfig,
) -> ProbabilityFilter {
    let horizon = config.horizon.max(1);
    let end = config.train_bars.min(bars.len());
    let mut data = Dataset::default();
    for t in 0..end.saturating_sub(horizon) {
        let row = feature_row(bars, vectors, t);
        if row.iter().all(|x| x.is_finite()) {
            data.push(row, bars[t + horizon].close > bars[t].close);
        }
    }
    debug!(
        samples = data.len(),
        trees = params.ml_n_estimators,
        "training ml filter"
    );
    ProbabilityFilter::train(&data, params.ml_n_estimators, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn wave(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n)
            .map(|i| 1.10 + (i as f64 * 0.21).sin() * 0.002 + i as f64 * 0.00001)
            .collect();
        make_bars(&closes)
    }

    #[test]
    fn too_short_history_is_data_error() {
        let params = ParameterSet::default();
        let err = SignalEngine::compute(&wave(5), &params, &SignalConfig::default()).unwrap_err();
        assert_eq!(err, DataError::InsufficientHistory { have: 5, need: 16 });
    }

    #[test]
    fn empty_history_is_data_error() {
        let err = SignalEngine::compute(&[], &ParameterSet::default(), &SignalConfig::default())
            .unwrap_err();
        assert_eq!(err, DataError::Empty);
    }

    #[test]
    fn vectors_align_with_bars() {
        let bars = wave(120);
        let params = ParameterSet {
            ml_enabled: false,
            ..ParameterSet::default()
        };
        let series = SignalEngine::compute(&bars, &params, &SignalConfig::default()).unwrap();
        assert_eq!(series.len(), bars.len());
        assert!(!series.get(3).unwrap().is_ready());
        assert!(series.get(119).unwrap().is_ready());
        assert_eq!(series.ml_active_from(), None);
        assert!(series
            .vectors()
            .iter()
            .all(|v| v.ml_probability == NEUTRAL_PROBABILITY));
    }

    #[test]
    fn ml_activates_after_training_window() {
        let bars = wave(300);
        let config = SignalConfig {
            ml: MlConfig {
                train_bars: 200,
                ..MlConfig::default()
            },
            ..SignalConfig::default()
        };
        let series = SignalEngine::compute(&bars, &ParameterSet::default(), &config).unwrap();
        assert_eq!(series.ml_active_from(), Some(200));
        assert!(series.vectors()[..200]
            .iter()
            .all(|v| v.ml_probability == NEUTRAL_PROBABILITY));
        assert!(series.vectors()[200..]
            .iter()
            .all(|v| (0.0..=1.0).contains(&v.ml_probability)));
    }

    #[test]
    fn prefix_signals_match_full_history() {
        let bars = wave(320);
        let config = SignalConfig {
            ml: MlConfig {
                train_bars: 150,
                ..MlConfig::default()
            },
            ..SignalConfig::default()
        };
        let params = ParameterSet::default();
        let full = SignalEngine::compute(&bars, &params, &config).unwrap();
        let prefix = SignalEngine::compute(&bars[..240], &params, &config).unwrap();
        for (t, v) in prefix.vectors().iter().enumerate() {
            let w = &full.vectors()[t];
            assert_eq!(v.pattern, w.pattern);
            assert_eq!(v.htf_bias, w.htf_bias);
            for (a, b) in [
                (v.fast_ma, w.fast_ma),
                (v.slow_ma, w.slow_ma),
                (v.rsi, w.rsi),
                (v.atr, w.atr),
                (v.ml_probability, w.ml_probability),
            ] {
                assert!(a.to_bits() == b.to_bits(), "bar {t}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn warmup_counts_slowest_input() {
        let params = ParameterSet {
            ema_slow: 40,
            ..ParameterSet::default()
        };
        assert_eq!(warmup_bars(&params, &SignalConfig::default()), 41);
    }
}
