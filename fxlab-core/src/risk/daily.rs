use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why trading stopped for the rest of a server day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaltReason {
    ProfitLock,
    LossLimit,
    LossStreak,
}

/// Per-day counters, reset exactly once at the first bar of each server day.
///
/// The halt is monotonic: once set it stays set, with its first reason, until
/// the next reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyState {
    pub day: NaiveDate,
    pub start_equity: f64,
    pub realized_pnl: f64,
    pub consecutive_losses: u32,
    halt: Option<HaltReason>,
}

impl DailyState {
    pub fn new(day: NaiveDate, start_equity: f64) -> Self {
        Self {
            day,
            start_equity,
            realized_pnl: 0.0,
            consecutive_losses: 0,
            halt: None,
        }
    }

    /// Book a closed trade. A winner or scratch breaks the losing streak.
    pub fn record_trade(&mut self, pnl: f64) {
        self.realized_pnl += pnl;
        if pnl < 0.0 {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }
    }

    /// Set the halt; returns false when it was already set.
    pub fn halt(&mut self, reason: HaltReason) -> bool {
        if self.halt.is_some() {
            return false;
        }
        self.halt = Some(reason);
        true
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halt
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    /// Realized P&L as a percentage of start-of-day equity.
    pub fn realized_pct(&self) -> f64 {
        if self.start_equity <= 0.0 {
            return 0.0;
        }
        self.realized_pnl / self.start_equity * 100.0
    }
}
