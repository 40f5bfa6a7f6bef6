//! Mutable engine state and run result types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::IdGen;
use crate::domain::{Bar, ExitReason, Position, Side, Trade};
use crate::risk::HaltReason;

/// An entry decided at one bar and filled at the next bar's open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingEntry {
    pub side: Side,
    pub decision_bar: usize,
    pub stop_distance: f64,
    pub target_distance: f64,
}

/// One point per processed bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub open_positions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaltEvent {
    pub timestamp: DateTime<Utc>,
    pub day: NaiveDate,
    pub reason: HaltReason,
}

/// Mutable state that evolves bar by bar. Only the loop touches it.
#[derive(Debug)]
pub struct EngineState {
    /// Realized cash: initial balance plus closed-trade P&L.
    pub balance: f64,
    /// Open positions in entry order.
    pub positions: Vec<Position>,
    pub trades: Vec<Trade>,
    pub pending: Option<PendingEntry>,
    pub id_gen: IdGen,
    /// Equity at the last completed bar.
    pub last_equity: f64,
}

impl EngineState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            positions: Vec::new(),
            trades: Vec::new(),
            pending: None,
            id_gen: IdGen::default(),
            last_equity: initial_balance,
        }
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// Balance plus unrealized P&L at `price`.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.balance + self.positions.iter().map(|p| p.pnl_at(price)).sum::<f64>()
    }

    /// Close the position at `idx`, book its P&L and return the trade.
    pub fn close_position(
        &mut self,
        idx: usize,
        bar_index: usize,
        bar: &Bar,
        price: f64,
        reason: ExitReason,
    ) -> Trade {
        let mut position = self.positions.remove(idx);
        let trade = position.close(bar_index, bar.timestamp, price, reason);
        self.balance += trade.pnl;
        self.trades.push(trade.clone());
        trade
    }

    /// Close every open position at `price`, oldest first; returns the
    /// realized P&L of each.
    pub fn close_all(
        &mut self,
        bar_index: usize,
        bar: &Bar,
        price: f64,
        reason: ExitReason,
    ) -> Vec<f64> {
        let mut pnls = Vec::with_capacity(self.positions.len());
        while !self.positions.is_empty() {
            pnls.push(self.close_position(0, bar_index, bar, price, reason).pnl);
        }
        pnls
    }
}

/// Output of a single backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub halts: Vec<HaltEvent>,
    pub account_halted_at: Option<DateTime<Utc>>,
    pub bar_count: usize,
    pub warmup_bars: usize,
}

impl RunResult {
    pub fn final_equity(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.equity)
    }

    pub fn max_open_positions(&self) -> usize {
        self.equity_curve
            .iter()
            .map(|p| p.open_positions)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionStatus, Timeframe};
    use chrono::TimeZone;

    fn bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            open: 1.1,
            high: 1.102,
            low: 1.099,
            close: 1.101,
            volume: 1.0,
            timeframe: Timeframe::M15,
            spread: None,
        }
    }

    fn open(state: &mut EngineState, side: Side) {
        let id = state.id_gen.next_position_id();
        state.positions.push(Position {
            id,
            side,
            entry_bar: 0,
            entry_time: bar().timestamp,
            entry_price: 1.1,
            lots: 0.1,
            units: 10_000.0,
            stop: 1.09,
            target: 1.12,
            stop_distance: 0.01,
            target_distance: 0.02,
            bars_held: 0,
            status: PositionStatus::Open,
        });
    }

    #[test]
    fn mark_to_market_includes_open_pnl() {
        let mut state = EngineState::new(10_000.0);
        open(&mut state, Side::Long);
        assert!((state.mark_to_market(1.101) - 10_010.0).abs() < 1e-6);
    }

    #[test]
    fn close_all_books_pnl_in_entry_order() {
        let mut state = EngineState::new(10_000.0);
        open(&mut state, Side::Long);
        open(&mut state, Side::Short);
        let pnls = state.close_all(3, &bar(), 1.101, ExitReason::ForcedHalt);
        assert_eq!(pnls.len(), 2);
        assert_eq!(state.open_count(), 0);
        assert_eq!(state.trades[0].position_id.0, 0);
        assert_eq!(state.trades[1].position_id.0, 1);
        // long +10, short -10
        assert!((state.balance - 10_000.0).abs() < 1e-6);
    }
}
