//! Bagged ensemble of shallow CART classifiers.

use rand::Rng;

use super::dataset::{Dataset, N_FEATURES};
use super::tree::{DecisionTree, TreeConfig};
use crate::rng::RngHierarchy;

#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub tree: TreeConfig,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit `n_estimators` trees, each on its own bootstrap sample.
    ///
    /// Tree `i` draws from the `("forest-tree", i)` stream, so the forest is a
    /// pure function of data, config and seed.
    pub fn fit(data: &Dataset, config: &ForestConfig) -> Self {
        let n = data.len();
        if n == 0 {
            return Self { trees: Vec::new() };
        }
        let hierarchy = RngHierarchy::new(config.seed);
        let max_features = ((N_FEATURES as f64).sqrt().round() as usize).max(1);
        let tree_config = TreeConfig {
            max_features: config.tree.max_features.min(max_features),
            ..config.tree.clone()
        };

        let trees = (0..config.n_estimators.max(1))
            .map(|i| {
                let mut rng = hierarchy.rng_for("forest-tree", i as u64);
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(data, &bootstrap, &tree_config, &mut rng)
            })
            .collect();
        Self { trees }
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Mean positive-class probability over all trees; 0.5 for an empty forest.
    pub fn predict_proba(&self, row: &[f64; N_FEATURES]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        total / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_trend() -> Dataset {
        let mut data = Dataset::default();
        for i in 0..200 {
            let x = ((i * 37) % 101) as f64 / 50.0 - 1.0;
            let mut row = [0.0; N_FEATURES];
            for (f, slot) in row.iter_mut().enumerate() {
                *slot = x * (f as f64 + 1.0) + ((i * (f + 3)) % 11) as f64 * 0.01;
            }
            data.push(row, x > 0.0);
        }
        data
    }

    fn config(seed: u64) -> ForestConfig {
        ForestConfig {
            n_estimators: 15,
            tree: TreeConfig::default(),
            seed,
        }
    }

    #[test]
    fn fit_is_deterministic() {
        let data = noisy_trend();
        let a = RandomForest::fit(&data, &config(42));
        let b = RandomForest::fit(&data, &config(42));
        let row = data.features[17];
        assert_eq!(a.predict_proba(&row).to_bits(), b.predict_proba(&row).to_bits());
    }

    #[test]
    fn probabilities_are_bounded_and_informative() {
        let data = noisy_trend();
        let forest = RandomForest::fit(&data, &config(7));
        assert_eq!(forest.n_estimators(), 15);
        let up = [0.9, 1.8, 2.7, 3.6, 4.5, 5.4];
        let down = [-0.9, -1.8, -2.7, -3.6, -4.5, -5.4];
        let (p_up, p_down) = (forest.predict_proba(&up), forest.predict_proba(&down));
        assert!((0.0..=1.0).contains(&p_up));
        assert!((0.0..=1.0).contains(&p_down));
        assert!(p_up > 0.5, "p_up = {p_up}");
        assert!(p_down < 0.5, "p_down = {p_down}");
    }
}
