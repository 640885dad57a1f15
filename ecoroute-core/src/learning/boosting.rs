//! Gradient boosted regression trees with squared loss

use log::trace;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::{Matrix, Regressor, validate_training_set};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    params: BoostingParams,
    init: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            init: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoosting {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), Error> {
        validate_training_set(x, y)?;
        if self.params.learning_rate <= 0.0 || !self.params.learning_rate.is_finite() {
            return Err(Error::ModelError(format!(
                "learning rate must be positive, got {}",
                self.params.learning_rate
            )));
        }

        #[allow(clippy::cast_precision_loss)]
        let n = y.len() as f64;
        self.init = y.iter().sum::<f64>() / n;
        self.trees.clear();

        let tree_params = TreeParams {
            max_depth: Some(self.params.max_depth),
            min_samples_leaf: self.params.min_samples_leaf,
            seed: self.params.seed,
            ..TreeParams::default()
        };
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut predictions = vec![self.init; y.len()];
        let mut residuals = vec![0.0; y.len()];

        for round in 0..self.params.n_estimators {
            for ((r, target), pred) in residuals.iter_mut().zip(y).zip(&predictions) {
                *r = target - pred;
            }

            let mut tree = RegressionTree::new(tree_params.clone());
            tree.fit_on(x, &residuals, (0..x.n_rows()).collect(), &mut rng);

            for (row, pred) in predictions.iter_mut().enumerate() {
                *pred += self.params.learning_rate * tree.predict_row(x.row(row));
            }
            self.trees.push(tree);

            if round % 50 == 0 {
                let sse: f64 = residuals.iter().map(|r| r * r).sum();
                trace!("boosting round {round}: residual SSE {sse:.4}");
            }
        }

        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|tree| self.params.learning_rate * tree.predict_row(row))
                .sum::<f64>()
    }
}
