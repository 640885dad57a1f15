//! CART regression tree minimizing squared error

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Matrix, Regressor, validate_training_set};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Unlimited when `None`
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features drawn at each split, all when `None`
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    params: TreeParams,
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf, the root alone has depth 0
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Grows the tree over the rows listed in `indices`, which may repeat
    /// (bootstrap samples).
    pub(crate) fn fit_on(&mut self, x: &Matrix, y: &[f64], indices: Vec<usize>, rng: &mut StdRng) {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![(0usize, indices, 0usize)];

        while let Some((node_idx, rows, depth)) = stack.pop() {
            let value = mean_of(y, &rows);
            nodes[node_idx] = Node::Leaf { value };

            if !self.may_split(rows.len(), depth) {
                continue;
            }
            let Some(split) = self.best_split(x, y, &rows, rng) else {
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .copied()
                .partition(|&row| x.get(row, split.feature) <= split.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf { value });
            let right = nodes.len();
            nodes.push(Node::Leaf { value });
            nodes[node_idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push((left, left_rows, depth + 1));
            stack.push((right, right_rows, depth + 1));
        }

        self.nodes = nodes;
    }

    fn may_split(&self, n_rows: usize, depth: usize) -> bool {
        n_rows >= self.params.min_samples_split.max(2)
            && n_rows >= 2 * self.params.min_samples_leaf.max(1)
            && self.params.max_depth.is_none_or(|max| depth < max)
    }

    fn best_split(
        &self,
        x: &Matrix,
        y: &[f64],
        rows: &[usize],
        rng: &mut StdRng,
    ) -> Option<Split> {
        let n_features = x.n_cols();
        let features: Vec<usize> = match self.params.max_features {
            Some(k) if k > 0 && k < n_features => {
                rand::seq::index::sample(rng, n_features, k).into_vec()
            }
            _ => (0..n_features).collect(),
        };

        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;
        let total: f64 = rows.iter().map(|&row| y[row]).sum();
        // score of the unsplit node, a split must improve on it
        let parent_score = total * total / n;
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<Split> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(rows.len());

        for feature in features {
            pairs.clear();
            pairs.extend(rows.iter().map(|&row| (x.get(row, feature), y[row])));
            pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for i in 0..pairs.len() - 1 {
                left_sum += pairs[i].1;
                let n_left = i + 1;
                let n_right = pairs.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let (lo, hi) = (pairs[i].0, pairs[i + 1].0);
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                #[allow(clippy::cast_precision_loss)]
                let score =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;

                if score > parent_score + 1e-12 * parent_score.abs().max(1.0)
                    && best.is_none_or(|b| score > b.score)
                {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best
    }
}

fn mean_of(y: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = rows.len() as f64;
    rows.iter().map(|&row| y[row]).sum::<f64>() / n
}

impl Regressor for RegressionTree {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), Error> {
        validate_training_set(x, y)?;
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        self.fit_on(x, y, (0..x.n_rows()).collect(), &mut rng);
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                None => return 0.0,
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}
