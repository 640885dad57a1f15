//! Bootstrap-aggregated regression trees

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::{Matrix, Regressor, validate_training_set};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree, otherwise every tree sees all rows
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), Error> {
        validate_training_set(x, y)?;
        if self.params.n_estimators == 0 {
            return Err(Error::ModelError(
                "a forest needs at least one tree".to_string(),
            ));
        }

        let n = x.n_rows();
        let params = &self.params;
        self.trees = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let rows: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.random_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let mut tree = RegressionTree::new(TreeParams {
                    max_depth: params.max_depth,
                    min_samples_leaf: params.min_samples_leaf,
                    max_features: params.max_features,
                    seed: params.seed,
                    ..TreeParams::default()
                });
                tree.fit_on(x, y, rows, &mut rng);
                tree
            })
            .collect();

        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.trees.len() as f64;
        self.trees.iter().map(|tree| tree.predict_row(row)).sum::<f64>() / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::metrics::r2_score;

    fn dataset() -> (Matrix, Vec<f64>) {
        let rows: Vec<[f64; 2]> = (0..80)
            .map(|i| [f64::from(i % 20), f64::from(i / 20)])
            .collect();
        let y = rows.iter().map(|r| 2.0 * r[0] - r[1]).collect();
        (Matrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn seeded_forests_are_reproducible() {
        let (x, y) = dataset();
        let params = ForestParams {
            n_estimators: 12,
            ..ForestParams::default()
        };

        let mut a = RandomForest::new(params.clone());
        let mut b = RandomForest::new(params);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.n_trees(), 12);
        assert_eq!(a.predict(&x), b.predict(&x));
        assert!(r2_score(&y, &a.predict(&x)) > 0.95);
    }

    #[test]
    fn without_bootstrap_every_tree_fits_exactly() {
        let (x, y) = dataset();
        let mut forest = RandomForest::new(ForestParams {
            n_estimators: 3,
            bootstrap: false,
            ..ForestParams::default()
        });
        forest.fit(&x, &y).unwrap();
        for (pred, truth) in forest.predict(&x).iter().zip(&y) {
            assert!((pred - truth).abs() < 1e-9);
        }
    }
}
