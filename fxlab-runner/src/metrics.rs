//! Performance metrics — pure functions over one run's equity curve and trades.
//!
//! Days are server days (`fxlab_core::risk::server_day`), so daily drawdown
//! and trading-day counts agree with the simulator's daily limits.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fxlab_core::domain::Trade;
use fxlab_core::engine::EquityPoint;
use fxlab_core::indicators::RollingWindow;
use fxlab_core::risk::server_day;

/// Trading days per year used to annualize Sharpe.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Length of the rolling return window.
pub const ROLLING_DAYS: usize = 7;
/// Minimum calendar span before rolling windows are used for volatility.
pub const MIN_ROLLING_SPAN_DAYS: i64 = 15;

/// Aggregate statistics for a single backtest. Percentages are in percent
/// (2.5 means 2.5%), drawdowns are positive magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub net_profit_pct: f64,
    pub max_daily_drawdown_pct: f64,
    pub max_drawdown_pct: f64,
    pub trade_count: usize,
    pub win_rate_pct: f64,
    pub sharpe: f64,
    pub trading_days: usize,
    pub volatility_pct: f64,
    pub span_days: i64,
    pub final_equity: f64,
}

impl Metrics {
    pub fn compute(
        curve: &[EquityPoint],
        trades: &[Trade],
        initial_balance: f64,
        day_offset_hours: i64,
    ) -> Self {
        let final_equity = curve.last().map_or(initial_balance, |p| p.equity);
        let closes = daily_closes(curve, day_offset_hours);
        let returns = daily_returns(initial_balance, &closes);
        let span = span_days(curve, day_offset_hours);
        Self {
            net_profit_pct: net_profit_pct(initial_balance, final_equity),
            max_daily_drawdown_pct: max_daily_drawdown_pct(curve, initial_balance, day_offset_hours),
            max_drawdown_pct: max_drawdown_pct(curve, initial_balance),
            trade_count: trades.len(),
            win_rate_pct: win_rate_pct(trades),
            sharpe: sharpe_ratio(&returns),
            trading_days: trading_days(trades, day_offset_hours),
            volatility_pct: volatility_pct(&returns, span),
            span_days: span,
            final_equity,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn net_profit_pct(initial_balance: f64, final_equity: f64) -> f64 {
    if initial_balance <= 0.0 {
        return 0.0;
    }
    (final_equity - initial_balance) / initial_balance * 100.0
}

/// Classic peak-to-trough drawdown; the peak starts at the initial balance.
pub fn max_drawdown_pct(curve: &[EquityPoint], initial_balance: f64) -> f64 {
    let mut peak = initial_balance;
    let mut max_dd = 0.0_f64;
    for p in curve {
        peak = peak.max(p.equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - p.equity) / peak);
        }
    }
    max_dd * 100.0
}

/// Worst intraday drawdown. Each day's running peak is seeded with the
/// equity the day started from (the previous point, or the initial balance).
pub fn max_daily_drawdown_pct(
    curve: &[EquityPoint],
    initial_balance: f64,
    day_offset_hours: i64,
) -> f64 {
    let mut current_day: Option<NaiveDate> = None;
    let mut previous = initial_balance;
    let mut peak = initial_balance;
    let mut max_dd = 0.0_f64;
    for p in curve {
        let day = server_day(p.timestamp, day_offset_hours);
        if current_day != Some(day) {
            current_day = Some(day);
            peak = previous;
        }
        peak = peak.max(p.equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - p.equity) / peak);
        }
        previous = p.equity;
    }
    max_dd * 100.0
}

pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Distinct server days on which at least one trade was opened.
pub fn trading_days(trades: &[Trade], day_offset_hours: i64) -> usize {
    trades
        .iter()
        .map(|t| server_day(t.entry_time, day_offset_hours))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Calendar days from the first to the last server day, inclusive.
pub fn span_days(curve: &[EquityPoint], day_offset_hours: i64) -> i64 {
    match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => {
            let from = server_day(first.timestamp, day_offset_hours);
            let to = server_day(last.timestamp, day_offset_hours);
            (to - from).num_days() + 1
        }
        _ => 0,
    }
}

/// Last equity of every server day that has at least one point.
pub fn daily_closes(curve: &[EquityPoint], day_offset_hours: i64) -> Vec<f64> {
    let mut closes: Vec<f64> = Vec::new();
    let mut current_day: Option<NaiveDate> = None;
    for p in curve {
        let day = server_day(p.timestamp, day_offset_hours);
        if current_day == Some(day) {
            if let Some(last) = closes.last_mut() {
                *last = p.equity;
            }
        } else {
            current_day = Some(day);
            closes.push(p.equity);
        }
    }
    closes
}

/// Day-over-day returns, the first measured against the initial balance.
pub fn daily_returns(initial_balance: f64, closes: &[f64]) -> Vec<f64> {
    let mut prev = initial_balance;
    closes
        .iter()
        .map(|&c| {
            let r = if prev > 0.0 { (c - prev) / prev } else { 0.0 };
            prev = c;
            r
        })
        .collect()
}

/// Annualized Sharpe of daily returns, zero risk-free rate.
///
/// Returns 0.0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Volatility in percent.
///
/// With at least `MIN_ROLLING_SPAN_DAYS` of data: standard deviation of the
/// rolling 7-day returns, each the sum of the last seven daily returns held in
/// a ring buffer. Shorter runs fall back to the daily standard deviation
/// scaled to a week.
pub fn volatility_pct(returns: &[f64], span_days: i64) -> f64 {
    if span_days < MIN_ROLLING_SPAN_DAYS {
        return std_dev(returns) * (ROLLING_DAYS as f64).sqrt() * 100.0;
    }
    let mut window = RollingWindow::new(ROLLING_DAYS);
    let mut weekly = Vec::with_capacity(returns.len());
    for &r in returns {
        window.push(r);
        if window.is_full() {
            weekly.push(window.sum());
        }
    }
    std_dev(&weekly) * 100.0
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
