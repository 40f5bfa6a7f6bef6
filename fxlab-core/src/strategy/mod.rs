//! Strategy decision logic.
//!
//! Entries need every condition to agree:
//!
//! | input              | long                  | short                     |
//! |--------------------|-----------------------|---------------------------|
//! | MA direction       | fast > slow           | fast < slow               |
//! | RSI                | below `rsi_hi`        | above `rsi_lo`            |
//! | engulfing pattern  | bullish               | bearish                   |
//! | ML probability     | P(up) >= 0.5          | 1 - P(up) >= 0.5          |
//! | H4 bias            | long                  | short                     |
//!
//! and the entry gate must be open. Exits are decided separately.

pub mod gate;

pub use gate::{EntryGate, ExecutionConfig, GateVerdict};

use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, ParameterSet, Position, Side};
use crate::features::SignalVector;

/// Minimum ML probability in the trade direction. Inclusive, so the neutral
/// pass-through value admits rule-only entries.
pub const ML_ACCEPTANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    EnterLong,
    EnterShort,
    Hold,
}

impl Decision {
    pub fn side(self) -> Option<Side> {
        match self {
            Self::EnterLong => Some(Side::Long),
            Self::EnterShort => Some(Side::Short),
            Self::Hold => None,
        }
    }
}

pub fn decide(signal: &SignalVector, params: &ParameterSet, gate: GateVerdict) -> Decision {
    if !gate.is_open() || !signal.is_ready() {
        return Decision::Hold;
    }
    let Some(direction) = signal.ma_direction() else {
        return Decision::Hold;
    };
    if signal.pattern != Some(direction) || signal.htf_bias != Some(direction) {
        return Decision::Hold;
    }
    match direction {
        Side::Long if signal.rsi < params.rsi_hi && signal.ml_probability >= ML_ACCEPTANCE => {
            Decision::EnterLong
        }
        Side::Short
            if signal.rsi > params.rsi_lo && 1.0 - signal.ml_probability >= ML_ACCEPTANCE =>
        {
            Decision::EnterShort
        }
        _ => Decision::Hold,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitConfig {
    /// Close at the bar close once held this many bars; `None` disables.
    pub max_bars_held: Option<usize>,
    /// Close when the MA direction turns against the position.
    pub exit_on_reverse_cross: bool,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            max_bars_held: Some(96),
            exit_on_reverse_cross: true,
        }
    }
}

/// Time and signal exits, evaluated at the bar close.
pub fn exit_signal(
    position: &Position,
    signal: &SignalVector,
    config: &ExitConfig,
) -> Option<ExitReason> {
    if config
        .max_bars_held
        .is_some_and(|max| position.bars_held >= max)
    {
        return Some(ExitReason::TimeExit);
    }
    if config.exit_on_reverse_cross
        && signal.is_ready()
        && signal.ma_direction() == Some(position.side.opposite())
    {
        return Some(ExitReason::SignalExit);
    }
    None
}
