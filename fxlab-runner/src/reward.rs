//! Constrained reward used to rank parameter sets.
//!
//! Hard constraints are checked in a fixed order; the first one that fails
//! makes the reward exactly `SENTINEL`. A feasible run scores
//!
//! ```text
//! reward  = net_profit% - penalty + bonus
//! penalty = 2 * max_dd%
//!         + 10 * (1 - exp(-volatility% / 2))
//!         + 5  * (1 - exp(-(trades - 35) / 50))
//! bonus   = [sharpe > 1.5] * 10 * (1 - exp(-(sharpe - 1.5)))
//!         + [win% > 60]    * (win% - 60) / 2
//! ```
//!
//! Every penalty term grows strictly with its input, the saturating terms are
//! bounded by their coefficient, and the two bonuses are non-negative and
//! independent of each other.

use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;

/// Score of any run that fails a hard constraint.
pub const SENTINEL: f64 = -1000.0;

pub const MIN_NET_PROFIT_PCT: f64 = 10.0;
pub const MAX_DAILY_DRAWDOWN_PCT: f64 = 3.0;
pub const MAX_DRAWDOWN_PCT: f64 = 6.0;
pub const MIN_TRADES: usize = 35;
pub const MIN_TRADING_DAYS: usize = 5;

const SHARPE_THRESHOLD: f64 = 1.5;
const WIN_RATE_THRESHOLD: f64 = 60.0;

/// The hard constraint a run failed, in checking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintViolation {
    NetProfitBelowTarget,
    DailyDrawdownBreached,
    DrawdownBreached,
    TooFewTrades,
    TooFewTradingDays,
}

/// First failing constraint, if any.
pub fn check_constraints(m: &Metrics) -> Option<ConstraintViolation> {
    // NaN fails the profit check as well
    if !(m.net_profit_pct >= MIN_NET_PROFIT_PCT) {
        return Some(ConstraintViolation::NetProfitBelowTarget);
    }
    if !(m.max_daily_drawdown_pct < MAX_DAILY_DRAWDOWN_PCT) {
        return Some(ConstraintViolation::DailyDrawdownBreached);
    }
    if !(m.max_drawdown_pct < MAX_DRAWDOWN_PCT) {
        return Some(ConstraintViolation::DrawdownBreached);
    }
    if m.trade_count < MIN_TRADES {
        return Some(ConstraintViolation::TooFewTrades);
    }
    if m.trading_days < MIN_TRADING_DAYS {
        return Some(ConstraintViolation::TooFewTradingDays);
    }
    None
}

pub fn reward(m: &Metrics) -> f64 {
    if check_constraints(m).is_some() {
        return SENTINEL;
    }
    let score = m.net_profit_pct - penalty(m) + bonus(m);
    if score.is_finite() {
        score
    } else {
        SENTINEL
    }
}

// ─── Terms ───────────────────────────────────────────────────────────

pub fn penalty(m: &Metrics) -> f64 {
    drawdown_penalty(m.max_drawdown_pct)
        + volatility_penalty(m.volatility_pct)
        + trade_excess_penalty(m.trade_count)
}

pub fn bonus(m: &Metrics) -> f64 {
    sharpe_bonus(m.sharpe) + win_rate_bonus(m.win_rate_pct)
}

/// Bounded by the drawdown constraint (at most 12 for a feasible run).
pub fn drawdown_penalty(max_drawdown_pct: f64) -> f64 {
    2.0 * max_drawdown_pct.max(0.0)
}

/// Saturates at 10.
pub fn volatility_penalty(volatility_pct: f64) -> f64 {
    10.0 * (1.0 - (-volatility_pct.max(0.0) / 2.0).exp())
}

/// Zero at 35 trades, saturates at 5.
pub fn trade_excess_penalty(trade_count: usize) -> f64 {
    let excess = trade_count.saturating_sub(MIN_TRADES) as f64;
    5.0 * (1.0 - (-excess / 50.0).exp())
}

/// Saturates at 10.
pub fn sharpe_bonus(sharpe: f64) -> f64 {
    if sharpe > SHARPE_THRESHOLD {
        10.0 * (1.0 - (-(sharpe - SHARPE_THRESHOLD)).exp())
    } else {
        0.0
    }
}

/// At most 20 (all winners).
pub fn win_rate_bonus(win_rate_pct: f64) -> f64 {
    if win_rate_pct > WIN_RATE_THRESHOLD {
        (win_rate_pct.min(100.0) - WIN_RATE_THRESHOLD) / 2.0
    } else {
        0.0
    }
}
