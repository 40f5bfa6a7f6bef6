//! Risk & money management.
//!
//! The risk module never touches equity. It answers three questions for the
//! simulator: may this entry open (and with how many lots), has the day hit a
//! limit, and has the account breached its floor.
//!
//! Daily limits apply to realized P&L against start-of-day equity and are
//! checked in a fixed order after every bar's exits:
//!
//! 1. realized ≥ `daily_profit_lock_pct` → close everything, halt (ProfitLock)
//! 2. realized ≤ −`daily_loss_limit_pct` → halt (LossLimit)
//! 3. `max_consecutive_losses` losers in a row → halt (LossStreak)
//!
//! The account floor is permanent: once equity falls below
//! `account_floor_pct` of the starting balance no further entries are admitted
//! for the rest of the run, daily resets notwithstanding.

pub mod daily;
pub mod sizing;

pub use daily::{DailyState, HaltReason};
pub use sizing::{bracket, position_lots, Bracket};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::Instrument;
use crate::error::ConfigError;

/// Hard cap on simultaneously open positions.
pub const MAX_OPEN_POSITIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub risk_per_trade_pct: f64,
    pub max_open_positions: usize,
    pub daily_profit_lock_pct: f64,
    pub daily_loss_limit_pct: f64,
    pub max_consecutive_losses: u32,
    pub account_floor_pct: f64,
    /// Shift applied to UTC before taking the calendar date.
    pub day_offset_hours: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade_pct: 0.5,
            max_open_positions: MAX_OPEN_POSITIONS,
            daily_profit_lock_pct: 2.0,
            daily_loss_limit_pct: 1.5,
            max_consecutive_losses: 3,
            account_floor_pct: 94.0,
            day_offset_hours: 0,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.5..=0.75).contains(&self.risk_per_trade_pct) {
            return Err(ConfigError::invalid(
                "risk.risk_per_trade_pct",
                format!("{} is outside [0.5, 0.75]", self.risk_per_trade_pct),
            ));
        }
        if !(1..=MAX_OPEN_POSITIONS).contains(&self.max_open_positions) {
            return Err(ConfigError::invalid(
                "risk.max_open_positions",
                format!("must be between 1 and {MAX_OPEN_POSITIONS}"),
            ));
        }
        for (key, value) in [
            ("risk.daily_profit_lock_pct", self.daily_profit_lock_pct),
            ("risk.daily_loss_limit_pct", self.daily_loss_limit_pct),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(key, "must be a positive percentage"));
            }
        }
        if self.max_consecutive_losses == 0 {
            return Err(ConfigError::invalid(
                "risk.max_consecutive_losses",
                "must be at least 1",
            ));
        }
        if !(self.account_floor_pct > 0.0 && self.account_floor_pct < 100.0) {
            return Err(ConfigError::invalid(
                "risk.account_floor_pct",
                "must lie strictly between 0 and 100",
            ));
        }
        if !(-23..=23).contains(&self.day_offset_hours) {
            return Err(ConfigError::invalid(
                "risk.day_offset_hours",
                "must lie within -23..=23",
            ));
        }
        Ok(())
    }
}

/// Calendar day of `ts` in server time.
pub fn server_day(ts: DateTime<Utc>, day_offset_hours: i64) -> NaiveDate {
    (ts + Duration::hours(day_offset_hours)).date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AccountHalted,
    DailyHalt(HaltReason),
    MaxPositions,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Admit { lots: f64 },
    Rejected(RejectReason),
}

/// What the simulator must do after a daily limit trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyAction {
    CloseAllAndHalt(HaltReason),
    Halt(HaltReason),
}

impl DailyAction {
    pub fn reason(self) -> HaltReason {
        match self {
            Self::CloseAllAndHalt(r) | Self::Halt(r) => r,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    initial_balance: f64,
    daily: Option<DailyState>,
    account_halted_at: Option<DateTime<Utc>>,
}

impl RiskManager {
    pub fn new(config: RiskConfig, initial_balance: f64) -> Self {
        Self {
            config,
            initial_balance,
            daily: None,
            account_halted_at: None,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn server_day(&self, ts: DateTime<Utc>) -> NaiveDate {
        server_day(ts, self.config.day_offset_hours)
    }

    /// Start a new `DailyState` when `ts` falls on a new server day.
    /// Returns true on reset.
    pub fn roll_day(&mut self, ts: DateTime<Utc>, equity: f64) -> bool {
        let day = self.server_day(ts);
        if self.daily.as_ref().is_some_and(|d| d.day == day) {
            return false;
        }
        self.daily = Some(DailyState::new(day, equity));
        true
    }

    pub fn daily(&self) -> Option<&DailyState> {
        self.daily.as_ref()
    }

    pub fn account_halted_at(&self) -> Option<DateTime<Utc>> {
        self.account_halted_at
    }

    pub fn is_account_halted(&self) -> bool {
        self.account_halted_at.is_some()
    }

    /// Admission verdict and size for a new entry.
    pub fn admit(
        &self,
        open_positions: usize,
        equity: f64,
        stop_distance: f64,
        instrument: &Instrument,
    ) -> Admission {
        if self.is_account_halted() {
            return Admission::Rejected(RejectReason::AccountHalted);
        }
        if let Some(reason) = self.daily.as_ref().and_then(DailyState::halt_reason) {
            return Admission::Rejected(RejectReason::DailyHalt(reason));
        }
        if open_positions >= self.config.max_open_positions.min(MAX_OPEN_POSITIONS) {
            return Admission::Rejected(RejectReason::MaxPositions);
        }
        let lots = position_lots(equity, self.config.risk_per_trade_pct, stop_distance, instrument);
        Admission::Admit { lots }
    }

    pub fn record_close(&mut self, pnl: f64) {
        if let Some(daily) = self.daily.as_mut() {
            daily.record_trade(pnl);
        }
    }

    /// Check the daily limits in order; returns the action only when a halt
    /// is newly triggered.
    pub fn evaluate_daily_limits(&mut self) -> Option<DailyAction> {
        let cfg = &self.config;
        let daily = self.daily.as_mut()?;
        if daily.is_halted() {
            return None;
        }
        let pct = daily.realized_pct();
        let action = if pct >= cfg.daily_profit_lock_pct {
            DailyAction::CloseAllAndHalt(HaltReason::ProfitLock)
        } else if pct <= -cfg.daily_loss_limit_pct {
            DailyAction::Halt(HaltReason::LossLimit)
        } else if daily.consecutive_losses >= cfg.max_consecutive_losses {
            DailyAction::Halt(HaltReason::LossStreak)
        } else {
            return None;
        };
        daily.halt(action.reason());
        info!(
            day = %daily.day,
            reason = ?action.reason(),
            realized_pct = pct,
            "daily trading halted"
        );
        Some(action)
    }

    /// Trip the permanent halt when equity breaches the floor. Returns true
    /// only on the bar that trips it.
    pub fn check_account(&mut self, equity: f64, ts: DateTime<Utc>) -> bool {
        if self.is_account_halted() {
            return false;
        }
        let floor = self.initial_balance * self.config.account_floor_pct / 100.0;
        if equity < floor {
            warn!(%ts, equity, floor, "account floor breached: trading halted for the rest of the run");
            self.account_halted_at = Some(ts);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn manager() -> RiskManager {
        let mut rm = RiskManager::new(RiskConfig::default(), 10_000.0);
        rm.roll_day(ts(4, 0), 10_000.0);
        rm
    }

    fn eurusd() -> Instrument {
        Instrument::default()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(RiskConfig::default().validate().is_ok());
    }

    #[test]
    fn risk_pct_outside_band_rejected() {
        for pct in [0.25, 1.0] {
            let cfg = RiskConfig {
                risk_per_trade_pct: pct,
                ..RiskConfig::default()
            };
            assert!(cfg.validate().is_err(), "{pct}");
        }
    }

    #[test]
    fn more_than_five_positions_rejected() {
        let cfg = RiskConfig {
            max_open_positions: 6,
            ..RiskConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn server_day_respects_offset() {
        let late = Utc.with_ymd_and_hms(2024, 3, 4, 22, 30, 0).unwrap();
        assert_eq!(server_day(late, 0), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(server_day(late, 2), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn roll_day_resets_once_per_day() {
        let mut rm = manager();
        assert!(!rm.roll_day(ts(4, 5), 9_000.0));
        assert_eq!(rm.daily().unwrap().start_equity, 10_000.0);
        assert!(rm.roll_day(ts(5, 0), 9_900.0));
        assert_eq!(rm.daily().unwrap().start_equity, 9_900.0);
    }

    #[test]
    fn admits_with_size() {
        let rm = manager();
        match rm.admit(0, 10_000.0, 0.0016, &eurusd()) {
            Admission::Admit { lots } => assert!((lots - 0.31).abs() < 1e-12),
            other => panic!("expected admit, got {other:?}"),
        }
    }

    #[test]
    fn sixth_position_rejected() {
        let rm = manager();
        assert_eq!(
            rm.admit(5, 10_000.0, 0.0016, &eurusd()),
            Admission::Rejected(RejectReason::MaxPositions)
        );
    }

    #[test]
    fn three_losses_halt_the_day() {
        let mut rm = manager();
        for _ in 0..2 {
            rm.record_close(-10.0);
            assert_eq!(rm.evaluate_daily_limits(), None);
        }
        rm.record_close(-10.0);
        assert_eq!(
            rm.evaluate_daily_limits(),
            Some(DailyAction::Halt(HaltReason::LossStreak))
        );
        assert_eq!(
            rm.admit(0, 9_970.0, 0.0016, &eurusd()),
            Admission::Rejected(RejectReason::DailyHalt(HaltReason::LossStreak))
        );
        rm.roll_day(ts(5, 0), 9_970.0);
        assert!(matches!(
            rm.admit(0, 9_970.0, 0.0016, &eurusd()),
            Admission::Admit { .. }
        ));
    }

    #[test]
    fn profit_lock_closes_everything() {
        let mut rm = manager();
        rm.record_close(250.0);
        assert_eq!(
            rm.evaluate_daily_limits(),
            Some(DailyAction::CloseAllAndHalt(HaltReason::ProfitLock))
        );
        // halted already: nothing new to report
        rm.record_close(-300.0);
        assert_eq!(rm.evaluate_daily_limits(), None);
        assert_eq!(
            rm.daily().unwrap().halt_reason(),
            Some(HaltReason::ProfitLock)
        );
    }

    #[test]
    fn loss_limit_before_streak() {
        let mut rm = manager();
        rm.record_close(-60.0);
        rm.record_close(-60.0);
        rm.record_close(-60.0);
        assert_eq!(
            rm.evaluate_daily_limits(),
            Some(DailyAction::Halt(HaltReason::LossLimit))
        );
    }

    #[test]
    fn account_floor_persists_across_days() {
        let mut rm = manager();
        assert!(!rm.check_account(9_400.0, ts(4, 3)));
        assert!(rm.check_account(9_390.0, ts(4, 4)));
        assert!(!rm.check_account(9_000.0, ts(4, 5)));
        assert_eq!(rm.account_halted_at(), Some(ts(4, 4)));
        rm.roll_day(ts(5, 0), 9_390.0);
        assert_eq!(
            rm.admit(0, 9_390.0, 0.0016, &eurusd()),
            Admission::Rejected(RejectReason::AccountHalted)
        );
    }
}
