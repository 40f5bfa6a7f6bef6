//! ML probability filter.
//!
//! The filter is a closed set of variants behind one contract,
//! `predict_probability(features) -> P(up)`:
//! - `PassThrough` always answers the neutral 0.5. Used when the ML toggle is
//!   off, or when the training window is unusable.
//! - `Forest` answers with a seeded random forest trained on the opening
//!   window of the bar history.

pub mod dataset;
pub mod forest;
pub mod tree;

pub use dataset::{Dataset, N_FEATURES};
pub use forest::{ForestConfig, RandomForest};
pub use tree::{DecisionTree, TreeConfig};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Probability reported when no model is available.
pub const NEUTRAL_PROBABILITY: f64 = 0.5;

/// Training settings shared by every trial; model size comes from the
/// parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlConfig {
    /// Bars at the start of the history reserved for training.
    pub train_bars: usize,
    /// Label horizon: is the close `horizon` bars ahead higher?
    pub horizon: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            train_bars: 400,
            horizon: 4,
            max_depth: 3,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum ProbabilityFilter {
    #[default]
    PassThrough,
    Forest(RandomForest),
}

impl ProbabilityFilter {
    /// Train a forest, or fall back to pass-through when the labels hold a
    /// single class.
    pub fn train(data: &Dataset, n_estimators: usize, config: &MlConfig) -> Self {
        if !data.has_both_classes() {
            debug!(
                samples = data.len(),
                "ml filter: training labels hold one class, using pass-through"
            );
            return Self::PassThrough;
        }
        let forest = RandomForest::fit(
            data,
            &ForestConfig {
                n_estimators,
                tree: TreeConfig {
                    max_depth: config.max_depth,
                    ..TreeConfig::default()
                },
                seed: config.seed,
            },
        );
        Self::Forest(forest)
    }

    pub fn predict_probability(&self, features: &[f64; N_FEATURES]) -> f64 {
        match self {
            Self::PassThrough => NEUTRAL_PROBABILITY,
            Self::Forest(forest) => {
                if features.iter().any(|v| !v.is_finite()) {
                    NEUTRAL_PROBABILITY
                } else {
                    forest.predict_proba(features)
                }
            }
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self, Self::Forest(_))
    }
}
