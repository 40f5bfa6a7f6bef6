//! Best-trial tracker shared by the parallel workers of one search.
//!
//! Every update is a single compare-and-update under one lock. A candidate
//! replaces the stored trial only if its reward is strictly greater; on an
//! exact tie the lower trial id stays, so the winner does not depend on the
//! order in which workers finish.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use fxlab_core::domain::{ParameterSet, TrialId};

use crate::metrics::Metrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTrial {
    pub trial_id: TrialId,
    pub params: ParameterSet,
    pub reward: f64,
    pub metrics: Option<Metrics>,
}

/// Outcome of offering a trial to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The candidate is the new best.
    Improved,
    /// The stored best was kept.
    Kept,
    /// Non-finite reward, never stored.
    Skipped,
}

#[derive(Debug, Default)]
pub struct BestTracker {
    inner: Mutex<Option<BestTrial>>,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `candidate` if it beats the current best.
    pub fn offer(&self, candidate: BestTrial) -> UpdateResult {
        if !candidate.reward.is_finite() {
            return UpdateResult::Skipped;
        }
        let mut best = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let improves = match best.as_ref() {
            None => true,
            Some(current) => {
                candidate.reward > current.reward
                    || (candidate.reward == current.reward && candidate.trial_id < current.trial_id)
            }
        };
        if improves {
            *best = Some(candidate);
            UpdateResult::Improved
        } else {
            UpdateResult::Kept
        }
    }

    /// Snapshot of the current best.
    pub fn best(&self) -> Option<BestTrial> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn best_reward(&self) -> Option<f64> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.reward)
    }

    pub fn into_inner(self) -> Option<BestTrial> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    fn trial(id: u64, reward: f64) -> BestTrial {
        BestTrial {
            trial_id: TrialId(id),
            params: ParameterSet::default(),
            reward,
            metrics: None,
        }
    }

    #[test]
    fn first_finite_offer_wins() {
        let tracker = BestTracker::new();
        assert_eq!(tracker.best(), None);
        assert_eq!(tracker.offer(trial(0, -1000.0)), UpdateResult::Improved);
        assert_eq!(tracker.best_reward(), Some(-1000.0));
    }

    #[test]
    fn only_strictly_greater_replaces() {
        let tracker = BestTracker::new();
        tracker.offer(trial(0, 5.0));
        assert_eq!(tracker.offer(trial(1, 4.0)), UpdateResult::Kept);
        assert_eq!(tracker.offer(trial(2, 5.0)), UpdateResult::Kept);
        assert_eq!(tracker.offer(trial(3, 5.5)), UpdateResult::Improved);
        assert_eq!(tracker.best().unwrap().trial_id, TrialId(3));
    }

    #[test]
    fn tie_keeps_lower_trial_id_regardless_of_order() {
        let tracker = BestTracker::new();
        tracker.offer(trial(7, 3.0));
        assert_eq!(tracker.offer(trial(2, 3.0)), UpdateResult::Improved);
        assert_eq!(tracker.best().unwrap().trial_id, TrialId(2));
    }

    #[test]
    fn nan_is_skipped() {
        let tracker = BestTracker::new();
        assert_eq!(tracker.offer(trial(0, f64::NAN)), UpdateResult::Skipped);
        assert!(tracker.into_inner().is_none());
    }

    #[test]
    fn concurrent_offers_keep_the_maximum() {
        let tracker = BestTracker::new();
        (0..1000u64).into_par_iter().for_each(|i| {
            let reward = ((i * 7919) % 1000) as f64;
            tracker.offer(trial(i, reward));
        });
        let best = tracker.into_inner().unwrap();
        assert_eq!(best.reward, 999.0);
        // 7919 * i = 999 (mod 1000) has exactly one solution below 1000
        assert_eq!((best.trial_id.0 * 7919) % 1000, 999);
    }
}
