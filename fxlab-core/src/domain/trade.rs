//! Trade — a completed round trip, immutable once recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::PositionId;
use super::position::Side;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// Moving-average direction turned against the position.
    SignalExit,
    /// Held for the configured maximum number of bars.
    TimeExit,
    /// Closed by the daily profit lock.
    ForcedHalt,
    /// Still open when the data ran out.
    EndOfData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub position_id: PositionId,
    pub side: Side,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Size & PnL ──
    pub lots: f64,
    pub pnl: f64,

    // ── Duration ──
    pub bars_held: usize,
    pub duration_secs: i64,

    // ── Bracket ──
    pub stop_distance: f64,
    pub target_distance: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }
}
