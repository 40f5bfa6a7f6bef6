//! Backtest simulator: the bar-by-bar loop and its supporting types.
//!
//! Seven steps per bar, strictly in order:
//!
//! 1. Roll the server day
//! 2. Fill the pending entry at this bar's open (after risk admission)
//! 3. Intrabar: stop/target checks against the bar range
//! 4. Close: time and signal exits
//! 5. Daily limits
//! 6. Mark-to-market, equity point, account floor
//! 7. Decide; an entry becomes pending for the next bar

pub mod config;
pub mod fills;
pub mod loop_runner;
pub mod state;

pub use config::EngineConfig;
pub use fills::{entry_fill, intrabar_exit};
pub use loop_runner::{run_backtest, validate_bars};
pub use state::{EngineState, EquityPoint, HaltEvent, PendingEntry, RunResult};
