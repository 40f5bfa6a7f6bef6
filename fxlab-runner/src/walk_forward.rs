//! Walk-forward split — a chronological train slice followed by the
//! walk-forward slice every trial is ranked on.
//!
//! The split is a single cut; the two slices never overlap and the
//! walk-forward slice always comes strictly after the training slice.

use serde::{Deserialize, Serialize};

use fxlab_core::domain::Bar;
use fxlab_core::error::DataError;

/// Bar index ranges of the two slices (start inclusive, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_start: usize,
    pub train_end: usize,
    pub test_start: usize,
    pub test_end: usize,
}

impl TrainTestSplit {
    /// Cut `total` bars after the leading `train_fraction` share.
    ///
    /// Both slices hold at least one bar; fewer than two bars cannot be split.
    pub fn new(total: usize, train_fraction: f64) -> Result<Self, DataError> {
        if total == 0 {
            return Err(DataError::Empty);
        }
        if total < 2 {
            return Err(DataError::InsufficientHistory {
                have: total,
                need: 2,
            });
        }
        let cut = ((total as f64) * train_fraction.clamp(0.0, 1.0)).floor() as usize;
        let cut = cut.clamp(1, total - 1);
        Ok(Self {
            train_start: 0,
            train_end: cut,
            test_start: cut,
            test_end: total,
        })
    }

    pub fn train_len(&self) -> usize {
        self.train_end - self.train_start
    }

    pub fn test_len(&self) -> usize {
        self.test_end - self.test_start
    }

    /// Fail unless both slices hold at least `need` bars.
    pub fn check_history(&self, need: usize) -> Result<(), DataError> {
        let have = self.train_len().min(self.test_len());
        if have < need {
            return Err(DataError::InsufficientHistory { have, need });
        }
        Ok(())
    }

    pub fn train<'a>(&self, bars: &'a [Bar]) -> &'a [Bar] {
        &bars[self.train_start..self.train_end]
    }

    pub fn test<'a>(&self, bars: &'a [Bar]) -> &'a [Bar] {
        &bars[self.test_start..self.test_end]
    }
}
