//! Engulfing candle pattern.
//!
//! Bullish: previous candle red, current green, current open below the
//! previous close and current close above the previous open.
//! Bearish: the mirror image.
//! Encoded as +1 (bullish), -1 (bearish), 0 (none). Lookback: 1.

use super::Indicator;
use crate::domain::{Bar, Side};

#[derive(Debug, Clone, Default)]
pub struct Engulfing;

/// Pattern formed by `cur` against `prev`, if any.
pub fn engulfing(prev: &Bar, cur: &Bar) -> Option<Side> {
    if prev.is_bearish() && cur.is_bullish() && cur.open < prev.close && cur.close > prev.open {
        Some(Side::Long)
    } else if prev.is_bullish()
        && cur.is_bearish()
        && cur.open > prev.close
        && cur.close < prev.open
    {
        Some(Side::Short)
    } else {
        None
    }
}

/// Decode the numeric encoding back into a direction.
pub fn pattern_side(encoded: f64) -> Option<Side> {
    if encoded > 0.0 {
        Some(Side::Long)
    } else if encoded < 0.0 {
        Some(Side::Short)
    } else {
        None
    }
}

impl Indicator for Engulfing {
    fn name(&self) -> &str {
        "engulfing"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        for i in 1..bars.len() {
            if bars[i].is_void() || bars[i - 1].is_void() {
                continue;
            }
            result[i] = match engulfing(&bars[i - 1], &bars[i]) {
                Some(side) => side.sign(),
                None => 0.0,
            };
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    #[test]
    fn bullish_engulfing_detected() {
        let bars = make_ohlc_bars(&[
            (1.1010, 1.1012, 1.0998, 1.1000), // red
            (1.0995, 1.1020, 1.0994, 1.1015), // green, opens below 1.1000, closes above 1.1010
        ]);
        assert_eq!(engulfing(&bars[0], &bars[1]), Some(Side::Long));
        let series = Engulfing.compute(&bars);
        assert!(series[0].is_nan());
        assert_eq!(series[1], 1.0);
    }

    #[test]
    fn bearish_engulfing_detected() {
        let bars = make_ohlc_bars(&[
            (1.1000, 1.1012, 1.0998, 1.1010), // green
            (1.1015, 1.1016, 1.0990, 1.0995), // red, opens above 1.1010, closes below 1.1000
        ]);
        assert_eq!(engulfing(&bars[0], &bars[1]), Some(Side::Short));
        assert_eq!(Engulfing.compute(&bars)[1], -1.0);
    }

    #[test]
    fn inside_candle_is_not_engulfing() {
        let bars = make_ohlc_bars(&[
            (1.1010, 1.1012, 1.0998, 1.1000),
            (1.1002, 1.1009, 1.1001, 1.1008), // green but contained
        ]);
        assert_eq!(engulfing(&bars[0], &bars[1]), None);
        assert_eq!(Engulfing.compute(&bars)[1], 0.0);
    }

    #[test]
    fn same_colour_is_not_engulfing() {
        let bars = make_ohlc_bars(&[
            (1.1000, 1.1012, 1.0998, 1.1010),
            (1.0990, 1.1030, 1.0989, 1.1025),
        ]);
        assert_eq!(engulfing(&bars[0], &bars[1]), None);
    }

    #[test]
    fn pattern_side_decodes() {
        assert_eq!(pattern_side(1.0), Some(Side::Long));
        assert_eq!(pattern_side(-1.0), Some(Side::Short));
        assert_eq!(pattern_side(0.0), None);
        assert_eq!(pattern_side(f64::NAN), None);
    }
}
