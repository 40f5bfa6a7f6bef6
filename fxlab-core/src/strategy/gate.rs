//! Direction-independent entry gates: spread ceiling and news blackout.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calendar::NewsCalendar;
use crate::domain::Bar;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Spread assumed when a bar carries none; also the entry slippage.
    pub spread_pips: f64,
    /// Entries are blocked while the spread is above this ceiling.
    pub max_spread_pips: f64,
    /// Half-width of the blackout around each high-impact event.
    pub news_window_minutes: i64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            spread_pips: 1.0,
            max_spread_pips: 2.0,
            news_window_minutes: 10,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spread_pips.is_finite() && self.spread_pips >= 0.0) {
            return Err(ConfigError::invalid(
                "execution.spread_pips",
                "must be a non-negative number",
            ));
        }
        if !(self.max_spread_pips.is_finite() && self.max_spread_pips >= 0.0) {
            return Err(ConfigError::invalid(
                "execution.max_spread_pips",
                "must be a non-negative number",
            ));
        }
        if self.news_window_minutes < 0 {
            return Err(ConfigError::invalid(
                "execution.news_window_minutes",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateVerdict {
    Open,
    SpreadTooWide { spread_pips: f64 },
    NewsBlackout,
}

impl GateVerdict {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Entry gate for one backtest. Without a calendar the news check is skipped.
#[derive(Debug, Clone)]
pub struct EntryGate<'a> {
    config: &'a ExecutionConfig,
    calendar: Option<&'a NewsCalendar>,
    window: Duration,
}

impl<'a> EntryGate<'a> {
    pub fn new(config: &'a ExecutionConfig, calendar: Option<&'a NewsCalendar>) -> Self {
        Self {
            config,
            calendar,
            window: Duration::minutes(config.news_window_minutes),
        }
    }

    /// Log once when running without a calendar feed.
    pub fn warn_if_unguarded(&self) {
        if self.calendar.is_none() {
            warn!("no economic calendar supplied: news blackout disabled for this run");
        }
    }

    pub fn check(&self, bar: &Bar) -> GateVerdict {
        let spread = bar.spread_or(self.config.spread_pips);
        if spread > self.config.max_spread_pips {
            return GateVerdict::SpreadTooWide {
                spread_pips: spread,
            };
        }
        match self.calendar {
            Some(cal) if cal.is_blackout(bar.timestamp, self.window) => GateVerdict::NewsBlackout,
            _ => GateVerdict::Open,
        }
    }
}
