//! Binary CART classifier used by the forest.
//!
//! Splits minimise weighted Gini impurity. Candidate thresholds are midpoints
//! at evenly spaced quantiles of the feature values reaching a node, which
//! caps the split search at `max_thresholds` per feature. Leaves store the
//! fraction of positive labels.

use rand::rngs::StdRng;
use rand::seq::index::sample;

use super::dataset::{Dataset, N_FEATURES};

#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `N_FEATURES` means all of them.
    pub max_features: usize,
    pub max_thresholds: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: N_FEATURES,
            max_thresholds: 16,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        p_up: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Fit on the rows of `data` selected by `indices` (repeats allowed).
    pub fn fit(data: &Dataset, indices: &[usize], config: &TreeConfig, rng: &mut StdRng) -> Self {
        Self {
            root: build(data, indices, 0, config, rng),
        }
    }

    /// Probability that the label is positive.
    pub fn predict_proba(&self, row: &[f64; N_FEATURES]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { p_up } => return *p_up,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

fn build(
    data: &Dataset,
    indices: &[usize],
    depth: usize,
    config: &TreeConfig,
    rng: &mut StdRng,
) -> Node {
    let n = indices.len();
    let pos = indices.iter().filter(|&&i| data.labels[i]).count();
    let p_up = if n == 0 { 0.5 } else { pos as f64 / n as f64 };

    if depth >= config.max_depth || n < config.min_samples_split || pos == 0 || pos == n {
        return Node::Leaf { p_up };
    }

    let parent = gini(pos, n);
    let Some(best) = best_split(data, indices, config, rng) else {
        return Node::Leaf { p_up };
    };
    if best.impurity >= parent {
        return Node::Leaf { p_up };
    }

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| data.features[i][best.feature] <= best.threshold);

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(build(data, &left_idx, depth + 1, config, rng)),
        right: Box::new(build(data, &right_idx, depth + 1, config, rng)),
    }
}

fn best_split(
    data: &Dataset,
    indices: &[usize],
    config: &TreeConfig,
    rng: &mut StdRng,
) -> Option<Split> {
    let n = indices.len();
    let k = config.max_features.clamp(1, N_FEATURES);
    let mut features: Vec<usize> = sample(rng, N_FEATURES, k).into_vec();
    features.sort_unstable();

    let mut best: Option<Split> = None;
    let mut values: Vec<f64> = Vec::with_capacity(n);

    for feature in features {
        values.clear();
        values.extend(indices.iter().map(|&i| data.features[i][feature]));
        values.sort_by(|a, b| a.total_cmp(b));

        let steps = config.max_thresholds.max(1);
        let mut last_threshold = f64::NAN;
        for q in 1..=steps {
            let at = q * n / (steps + 1);
            if at == 0 || at >= n || values[at - 1] == values[at] {
                continue;
            }
            let threshold = 0.5 * (values[at - 1] + values[at]);
            if threshold == last_threshold {
                continue;
            }
            last_threshold = threshold;

            let (mut left_n, mut left_pos, mut right_pos) = (0usize, 0usize, 0usize);
            for &i in indices {
                let label = data.labels[i];
                if data.features[i][feature] <= threshold {
                    left_n += 1;
                    left_pos += usize::from(label);
                } else {
                    right_pos += usize::from(label);
                }
            }
            let right_n = n - left_n;
            if left_n < config.min_samples_leaf || right_n < config.min_samples_leaf {
                continue;
            }
            let impurity = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(right_pos, right_n))
                / n as f64;
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn separable() -> Dataset {
        // Label is positive exactly when feature 0 > 0.
        let mut data = Dataset::default();
        for i in 0..60 {
            let x = i as f64 - 30.0;
            let mut row = [0.0; N_FEATURES];
            row[0] = x;
            row[1] = (i % 7) as f64;
            data.push(row, x > 0.0);
        }
        data
    }

    #[test]
    fn learns_single_threshold() {
        let data = separable();
        let idx: Vec<usize> = (0..data.len()).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&data, &idx, &TreeConfig::default(), &mut rng);

        let mut hi = [0.0; N_FEATURES];
        hi[0] = 25.0;
        let mut lo = [0.0; N_FEATURES];
        lo[0] = -25.0;
        assert!(tree.predict_proba(&hi) > 0.9);
        assert!(tree.predict_proba(&lo) < 0.1);
    }

    #[test]
    fn pure_node_is_leaf() {
        let mut data = Dataset::default();
        for i in 0..20 {
            data.push([i as f64; N_FEATURES], true);
        }
        let idx: Vec<usize> = (0..data.len()).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&data, &idx, &TreeConfig::default(), &mut rng);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba(&[0.0; N_FEATURES]), 1.0);
    }

    #[test]
    fn depth_is_capped() {
        let data = separable();
        let idx: Vec<usize> = (0..data.len()).collect();
        let config = TreeConfig {
            max_depth: 2,
            ..TreeConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(&data, &idx, &config, &mut rng);
        assert!(tree.depth() <= 3);
    }
}
