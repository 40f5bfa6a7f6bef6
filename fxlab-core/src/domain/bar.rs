//! Bar — the fundamental market data unit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Bar timeframe tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    #[default]
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn minutes(self) -> i64 {
        match self {
            Self::M1 => 1,
            Self::M5 => 5,
            Self::M15 => 15,
            Self::M30 => 30,
            Self::H1 => 60,
            Self::H4 => 240,
            Self::D1 => 1440,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

/// OHLCV bar for the traded pair, stamped in UTC at the bar open.
///
/// Prices are bid quotes. `spread` is the quoted spread in pips when the
/// data source carries it; otherwise the configured default applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub spread: Option<f64>,
}

impl Bar {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.spread.map_or(true, |s| s.is_finite() && s >= 0.0)
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Effective spread in pips: the bar's own quote or `default_pips`.
    pub fn spread_or(&self, default_pips: f64) -> f64 {
        self.spread.unwrap_or(default_pips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 10, 15, 0).unwrap(),
            open: 1.0850,
            high: 1.0862,
            low: 1.0845,
            close: 1.0858,
            volume: 1200.0,
            timeframe: Timeframe::M15,
            spread: None,
        }
    }

    #[test]
    fn sane_bar_passes() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn high_below_close_is_insane() {
        let mut bar = sample_bar();
        bar.high = 1.0850;
        assert!(!bar.is_sane());
    }

    #[test]
    fn nan_price_is_void() {
        let mut bar = sample_bar();
        bar.low = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn negative_spread_is_insane() {
        let mut bar = sample_bar();
        bar.spread = Some(-0.1);
        assert!(!bar.is_sane());
    }

    #[test]
    fn spread_falls_back_to_default() {
        let mut bar = sample_bar();
        assert_eq!(bar.spread_or(1.2), 1.2);
        bar.spread = Some(0.4);
        assert_eq!(bar.spread_or(1.2), 0.4);
    }

    #[test]
    fn timeframe_minutes() {
        assert_eq!(Timeframe::M15.minutes(), 15);
        assert_eq!(Timeframe::H4.duration(), Duration::hours(4));
    }
}
