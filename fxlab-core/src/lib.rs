//! fxlab core: domain types, signals, strategy, risk and the backtest simulator.
//!
//! This crate holds everything a single deterministic backtest needs:
//! - Domain types (bars, instrument, parameter sets, positions, trades)
//! - Indicators and the feature/signal engine with its ML probability filter
//! - Entry decision logic, entry gates and exit triggers
//! - Risk module: bracket sizing, daily limits, account floor
//! - Bar-by-bar simulator producing an equity curve and trade log
//!
//! Scoring and search live in `fxlab-runner`.

pub mod calendar;
pub mod domain;
pub mod engine;
pub mod error;
pub mod features;
pub mod indicators;
pub mod ml;
pub mod risk;
pub mod rng;
pub mod strategy;

pub use engine::{run_backtest, EngineConfig, RunResult};
pub use error::{BacktestError, ConfigError, DataError, SimulationError};
