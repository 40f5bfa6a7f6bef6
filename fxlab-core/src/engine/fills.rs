//! Fill prices for entries and bracket exits.
//!
//! Entries pay the spread on top of the open. Stop and target exits fill at
//! their level, or at the open when the bar gaps through the level. When both
//! levels sit inside one bar the stop is assumed to trade first.

use crate::domain::{Bar, ExitReason, Position, Side};

/// Entry price for `side` at the open of `bar`; `spread` is in price units.
pub fn entry_fill(side: Side, bar: &Bar, spread: f64) -> f64 {
    match side {
        Side::Long => bar.open + spread,
        Side::Short => bar.open - spread,
    }
}

/// Stop/target check for one open position against one bar.
pub fn intrabar_exit(position: &Position, bar: &Bar) -> Option<(f64, ExitReason)> {
    let (stop, target) = (position.stop, position.target);
    match position.side {
        Side::Long => {
            if bar.open <= stop {
                Some((bar.open, ExitReason::StopLoss))
            } else if bar.open >= target {
                Some((bar.open, ExitReason::TakeProfit))
            } else if bar.low <= stop {
                Some((stop, ExitReason::StopLoss))
            } else if bar.high >= target {
                Some((target, ExitReason::TakeProfit))
            } else {
                None
            }
        }
        Side::Short => {
            if bar.open >= stop {
                Some((bar.open, ExitReason::StopLoss))
            } else if bar.open <= target {
                Some((bar.open, ExitReason::TakeProfit))
            } else if bar.high >= stop {
                Some((stop, ExitReason::StopLoss))
            } else if bar.low <= target {
                Some((target, ExitReason::TakeProfit))
            } else {
                None
            }
        }
    }
}
