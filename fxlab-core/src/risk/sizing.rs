//! ATR-scaled brackets and fixed-fractional lot sizing.
//!
//! # Formula
//! ```text
//! stop_distance   = atr_sl_mult * ATR
//! target_distance = atr_tp_mult * ATR
//! risk_amount     = equity * risk_pct / 100
//! stop_pips       = stop_distance / pip_size
//! lots            = risk_amount / (stop_pips * pip_value_per_lot)
//! ```
//! Lots are floored to the lot step and never drop below the minimum lot.
//!
//! # Example
//! - Equity: 10,000, risk 0.5% → 50
//! - ATR: 0.0008, stop multiplier 2.0 → stop 16 pips
//! - Pip value 10 per lot → 50 / 160 = 0.3125 → 0.31 lots

use crate::domain::{Instrument, ParameterSet};
use crate::error::SimulationError;

/// Stop and target distances in price units, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub stop_distance: f64,
    pub target_distance: f64,
}

/// Bracket from the ATR at the decision bar.
pub fn bracket(atr: f64, params: &ParameterSet, bar_index: usize) -> Result<Bracket, SimulationError> {
    if !(atr.is_finite() && atr > 0.0) {
        return Err(SimulationError::DegenerateVolatility { bar_index, atr });
    }
    Ok(Bracket {
        stop_distance: params.atr_sl_mult * atr,
        target_distance: params.atr_tp_mult * atr,
    })
}

/// Lots that risk `risk_pct` percent of `equity` over `stop_distance`.
pub fn position_lots(
    equity: f64,
    risk_pct: f64,
    stop_distance: f64,
    instrument: &Instrument,
) -> f64 {
    let risk_amount = equity.max(0.0) * risk_pct / 100.0;
    let stop_pips = instrument.price_to_pips(stop_distance);
    let raw = risk_amount / (stop_pips * instrument.pip_value_per_lot);
    instrument.round_lots(raw)
}
