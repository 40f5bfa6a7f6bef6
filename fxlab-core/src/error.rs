//! Error taxonomy shared by the signal engine, risk module and simulator.
//!
//! - `DataError`: the bar history itself is unusable. Aborts the whole run.
//! - `ConfigError`: a parameter or setting is invalid. Scores a single trial
//!   at the sentinel without simulating it.
//! - `SimulationError`: an unrecoverable numeric fault mid-simulation. Aborts
//!   the trial, which is then scored at the sentinel.
//!
//! Constraint failures of the reward are not errors; they are the sentinel score.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no bars supplied")]
    Empty,
    #[error("insufficient history: have {have} bars, need {need}")]
    InsufficientHistory { have: usize, need: usize },
    #[error("bars out of order at index {index}: {current} is not after {previous}")]
    OutOfOrder {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[error("malformed bar at index {index} ({timestamp})")]
    Malformed {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("parameter '{field}' = {value} outside bounds [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("parameter '{field}' is fixed to {expected} by the search space")]
    FixedFlag { field: &'static str, expected: bool },
    #[error("'{lower}' must be strictly below '{upper}'")]
    Ordering {
        lower: &'static str,
        upper: &'static str,
    },
    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("degenerate volatility at bar {bar_index}: atr = {atr}")]
    DegenerateVolatility { bar_index: usize, atr: f64 },
    #[error("non-finite equity at bar {bar_index}")]
    NonFiniteEquity { bar_index: usize },
}

/// Everything a single backtest can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}
