//! Bar-by-bar event loop.
//!
//! Equity changes only here: entries move nothing, closes book realized P&L
//! into the balance, and each bar's equity point marks open positions at the
//! close.

use tracing::{debug, trace};

use crate::calendar::NewsCalendar;
use crate::domain::{Bar, ExitReason, ParameterSet, Position, PositionStatus};
use crate::error::{BacktestError, DataError, SimulationError};
use crate::features::SignalEngine;
use crate::risk::{bracket, Admission, DailyAction, RiskManager};
use crate::strategy::{decide, exit_signal, EntryGate};

use super::config::EngineConfig;
use super::fills::{entry_fill, intrabar_exit};
use super::state::{EngineState, EquityPoint, HaltEvent, PendingEntry, RunResult};

/// Reject empty, unordered or malformed bar histories.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::Empty);
    }
    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(DataError::Malformed {
                index,
                timestamp: bar.timestamp,
            });
        }
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(DataError::OutOfOrder {
                index,
                previous: bars[index - 1].timestamp,
                current: bar.timestamp,
            });
        }
    }
    Ok(())
}

/// Run one deterministic backtest of `params` over `bars`.
///
/// Without a calendar the news gate stays open; callers log that once per run.
pub fn run_backtest(
    bars: &[Bar],
    params: &ParameterSet,
    config: &EngineConfig,
    calendar: Option<&NewsCalendar>,
) -> Result<RunResult, BacktestError> {
    validate_bars(bars)?;
    config.validate()?;
    params.validate(&config.bounds)?;

    let signals = SignalEngine::compute(bars, params, &config.signal)?;
    let gate = EntryGate::new(&config.execution, calendar);
    let n = bars.len();

    let mut state = EngineState::new(config.initial_balance);
    let mut risk = RiskManager::new(config.risk.clone(), config.initial_balance);
    let mut equity_curve = Vec::with_capacity(n);
    let mut halts = Vec::new();

    for (t, bar) in bars.iter().enumerate() {
        let signal = signals.vectors()[t];

        // ─── 1. Day roll ───
        if risk.roll_day(bar.timestamp, state.last_equity) {
            trace!(bar = t, day = %risk.server_day(bar.timestamp), "new server day");
        }

        // ─── 2. Pending entry ───
        if let Some(pending) = state.pending.take() {
            fill_pending(&mut state, &risk, &gate, pending, t, bar, config);
        }

        // ─── 3. Intrabar stop/target ───
        let mut i = 0;
        while i < state.positions.len() {
            match intrabar_exit(&state.positions[i], bar) {
                Some((price, reason)) => {
                    let trade = state.close_position(i, t, bar, price, reason);
                    risk.record_close(trade.pnl);
                }
                None => i += 1,
            }
        }

        // ─── 4. Close: time and signal exits ───
        let mut i = 0;
        while i < state.positions.len() {
            state.positions[i].tick_bar();
            match exit_signal(&state.positions[i], &signal, &config.exits) {
                Some(reason) => {
                    let trade = state.close_position(i, t, bar, bar.close, reason);
                    risk.record_close(trade.pnl);
                }
                None => i += 1,
            }
        }

        // ─── 5. Daily limits ───
        if let Some(action) = risk.evaluate_daily_limits() {
            halts.push(HaltEvent {
                timestamp: bar.timestamp,
                day: risk.server_day(bar.timestamp),
                reason: action.reason(),
            });
            if let DailyAction::CloseAllAndHalt(_) = action {
                for pnl in state.close_all(t, bar, bar.close, ExitReason::ForcedHalt) {
                    risk.record_close(pnl);
                }
            }
        }

        // ─── 6. Mark-to-market and account floor ───
        let equity = state.mark_to_market(bar.close);
        if !equity.is_finite() {
            return Err(SimulationError::NonFiniteEquity { bar_index: t }.into());
        }
        state.last_equity = equity;
        if risk.check_account(equity, bar.timestamp) {
            // closing at the close leaves equity unchanged
            for pnl in state.close_all(t, bar, bar.close, ExitReason::ForcedHalt) {
                risk.record_close(pnl);
            }
        }
        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
            open_positions: state.open_count(),
        });

        // ─── 7. Decision ───
        if t + 1 >= n || risk.is_account_halted() {
            continue;
        }
        let decision = decide(&signal, params, gate.check(bar));
        if let Some(side) = decision.side() {
            let b = bracket(signal.atr, params, t)?;
            state.pending = Some(PendingEntry {
                side,
                decision_bar: t,
                stop_distance: b.stop_distance,
                target_distance: b.target_distance,
            });
        }
    }

    if let Some(last) = bars.last() {
        state.close_all(n - 1, last, last.close, ExitReason::EndOfData);
    }

    debug!(
        bars = n,
        trades = state.trades.len(),
        halts = halts.len(),
        final_equity = state.last_equity,
        "backtest complete"
    );

    Ok(RunResult {
        equity_curve,
        trades: state.trades,
        halts,
        account_halted_at: risk.account_halted_at(),
        bar_count: n,
        warmup_bars: signals.warmup(),
    })
}

/// Open the pending entry at `bar`'s open. The gate is checked again on the
/// fill bar, whose spread and timestamp are the ones actually traded.
fn fill_pending(
    state: &mut EngineState,
    risk: &RiskManager,
    gate: &EntryGate<'_>,
    pending: PendingEntry,
    t: usize,
    bar: &Bar,
    config: &EngineConfig,
) {
    let verdict = gate.check(bar);
    if !verdict.is_open() {
        trace!(bar = t, ?verdict, "entry dropped at fill");
        return;
    }
    let lots = match risk.admit(
        state.open_count(),
        state.last_equity,
        pending.stop_distance,
        &config.instrument,
    ) {
        Admission::Admit { lots } => lots,
        Admission::Rejected(reason) => {
            trace!(bar = t, ?reason, "entry rejected");
            return;
        }
    };
    let spread = config
        .instrument
        .pips_to_price(bar.spread_or(config.execution.spread_pips));
    let entry_price = entry_fill(pending.side, bar, spread);
    let sign = pending.side.sign();
    let id = state.id_gen.next_position_id();
    trace!(bar = t, %id, side = ?pending.side, entry_price, lots, "entry filled");
    state.positions.push(Position {
        id,
        side: pending.side,
        entry_bar: t,
        entry_time: bar.timestamp,
        entry_price,
        lots,
        units: lots * config.instrument.contract_size,
        stop: entry_price - sign * pending.stop_distance,
        target: entry_price + sign * pending.target_distance,
        stop_distance: pending.stop_distance,
        target_distance: pending.target_distance,
        bars_held: 0,
        status: PositionStatus::Open,
    });
}
