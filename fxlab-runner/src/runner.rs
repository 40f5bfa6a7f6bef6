//! Backtest runner — wires the simulator, metrics and reward together.
//!
//! `backtest()` is the single-run entry point used by the CLI. The optimizer
//! scores trials through `evaluate()`, which skips the once-per-run logging.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fxlab_core::calendar::NewsCalendar;
use fxlab_core::domain::{Bar, ParameterSet};
use fxlab_core::engine::{run_backtest, EngineConfig, RunResult};
use fxlab_core::error::BacktestError;
use fxlab_core::strategy::EntryGate;

use crate::metrics::Metrics;
use crate::reward::{check_constraints, reward, ConstraintViolation};

/// Everything one backtest produced, plus its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub params: ParameterSet,
    pub run: RunResult,
    pub metrics: Metrics,
    pub reward: f64,
    /// First hard constraint the run failed, if any.
    pub violation: Option<ConstraintViolation>,
}

impl BacktestReport {
    pub fn is_feasible(&self) -> bool {
        self.violation.is_none()
    }
}

/// Run and score one parameter set.
pub fn backtest(
    params: &ParameterSet,
    bars: &[Bar],
    config: &EngineConfig,
    calendar: Option<&NewsCalendar>,
) -> Result<BacktestReport, BacktestError> {
    EntryGate::new(&config.execution, calendar).warn_if_unguarded();
    evaluate(params, bars, config, calendar)
}

/// Run and score without run-level logging.
pub fn evaluate(
    params: &ParameterSet,
    bars: &[Bar],
    config: &EngineConfig,
    calendar: Option<&NewsCalendar>,
) -> Result<BacktestReport, BacktestError> {
    let run = run_backtest(bars, params, config, calendar)?;
    let metrics = Metrics::compute(
        &run.equity_curve,
        &run.trades,
        config.initial_balance,
        config.risk.day_offset_hours,
    );
    let violation = check_constraints(&metrics);
    let reward = reward(&metrics);
    debug!(
        trades = metrics.trade_count,
        net_profit_pct = metrics.net_profit_pct,
        max_dd_pct = metrics.max_drawdown_pct,
        reward,
        ?violation,
        "backtest scored"
    );
    Ok(BacktestReport {
        params: *params,
        run,
        metrics,
        reward,
        violation,
    })
}
