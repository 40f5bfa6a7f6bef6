use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::PositionId;
use super::trade::{ExitReason, Trade};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// An open bracketed position.
///
/// Stop and target are absolute price levels fixed at entry; they never move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub side: Side,
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub lots: f64,
    /// Base-currency units (lots × contract size).
    pub units: f64,
    pub stop: f64,
    pub target: f64,
    pub stop_distance: f64,
    pub target_distance: f64,
    pub bars_held: usize,
    pub status: PositionStatus,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// P&L in account currency if closed at `price`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.side.sign() * self.units
    }

    pub fn tick_bar(&mut self) {
        self.bars_held += 1;
    }

    /// Close the position and produce its trade record.
    pub fn close(
        &mut self,
        exit_bar: usize,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        reason: ExitReason,
    ) -> Trade {
        self.status = PositionStatus::Closed;
        Trade {
            position_id: self.id,
            side: self.side,
            entry_bar: self.entry_bar,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            exit_bar,
            exit_time,
            exit_price,
            lots: self.lots,
            pnl: self.pnl_at(exit_price),
            bars_held: self.bars_held,
            duration_secs: (exit_time - self.entry_time).num_seconds(),
            exit_reason: reason,
            stop_distance: self.stop_distance,
            target_distance: self.target_distance,
        }
    }
}
