//! Exhaustive hyper-parameter search for the boosted cost model.
//!
//! Every candidate is scored by the mean cross-validated [`robust_score`];
//! candidate/fold pairs are evaluated in parallel. The winner is refit on
//! the whole training set.

use itertools::iproduct;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::boosting::{BoostingParams, GradientBoosting};
use super::matrix::select;
use super::metrics::robust_score;
use super::split::k_fold;
use super::{Matrix, Pipeline, Regressor};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<usize>,
    pub learning_rate: Vec<f64>,
}

impl Default for BoostingGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![200, 500],
            max_depth: vec![10, 15],
            learning_rate: vec![0.05, 0.1],
        }
    }
}

impl BoostingGrid {
    /// Cartesian product of the grid, other fields taken from `base`
    pub fn candidates(&self, base: &BoostingParams) -> Vec<BoostingParams> {
        iproduct!(&self.n_estimators, &self.max_depth, &self.learning_rate)
            .map(|(&n_estimators, &max_depth, &learning_rate)| BoostingParams {
                n_estimators,
                max_depth,
                learning_rate,
                ..base.clone()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub params: BoostingParams,
    pub mean_score: f64,
}

#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best_params: BoostingParams,
    pub best_score: f64,
    pub scores: Vec<CandidateScore>,
    /// Best candidate refit on all rows
    pub model: Pipeline<GradientBoosting>,
}

#[derive(Debug, Clone)]
pub struct GridSearch {
    pub grid: BoostingGrid,
    pub folds: usize,
}

impl GridSearch {
    pub fn new(grid: BoostingGrid, folds: usize) -> Self {
        Self { grid, folds }
    }

    /// # Errors
    ///
    /// Returns an error if the grid is empty, the fold count does not fit
    /// the data, or any fit fails.
    pub fn run(
        &self,
        x: &Matrix,
        y: &[f64],
        base: &BoostingParams,
    ) -> Result<GridSearchResult, Error> {
        let candidates = self.grid.candidates(base);
        if candidates.is_empty() {
            return Err(Error::ConfigError("parameter grid is empty".to_string()));
        }
        let folds = k_fold(x.n_rows(), self.folds)?;

        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len()
        );

        let fold_scores: Vec<(usize, f64)> = iproduct!(0..candidates.len(), 0..folds.len())
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(candidate, fold)| -> Result<(usize, f64), Error> {
                let (train, test) = &folds[fold];
                let mut model = Pipeline::new(GradientBoosting::new(candidates[candidate].clone()));
                model.fit(&x.select_rows(train), &select(y, train))?;
                let pred = model.predict(&x.select_rows(test));
                Ok((candidate, robust_score(&select(y, test), &pred)))
            })
            .collect::<Result<_, Error>>()?;

        let mut totals = vec![0.0; candidates.len()];
        for (candidate, score) in fold_scores {
            totals[candidate] += score;
        }

        #[allow(clippy::cast_precision_loss)]
        let n_folds = folds.len() as f64;
        let scores: Vec<CandidateScore> = candidates
            .into_iter()
            .zip(totals)
            .map(|(params, total)| CandidateScore {
                params,
                mean_score: total / n_folds,
            })
            .collect();

        for score in &scores {
            info!(
                "n_estimators={} max_depth={} learning_rate={}: robust score {:.4}",
                score.params.n_estimators,
                score.params.max_depth,
                score.params.learning_rate,
                score.mean_score
            );
        }

        // first candidate wins ties
        let best = scores
            .iter()
            .enumerate()
            .fold(0, |best, (idx, score)| {
                if score.mean_score > scores[best].mean_score {
                    idx
                } else {
                    best
                }
            });
        let best_params = scores[best].params.clone();
        let best_score = scores[best].mean_score;

        let mut model = Pipeline::new(GradientBoosting::new(best_params.clone()));
        model.fit(x, y)?;
        info!("Best robust score {best_score:.4} with {best_params:?}");

        Ok(GridSearchResult {
            best_params,
            best_score,
            scores,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_cover_the_product() {
        let grid = BoostingGrid {
            n_estimators: vec![10, 20],
            max_depth: vec![2, 3, 4],
            learning_rate: vec![0.1],
        };
        let candidates = grid.candidates(&BoostingParams::default());
        assert_eq!(candidates.len(), 6);
        assert_eq!(candidates[0].n_estimators, 10);
        assert_eq!(candidates[0].max_depth, 2);
        assert_eq!(candidates[5].n_estimators, 20);
        assert_eq!(candidates[5].max_depth, 4);
    }

    #[test]
    fn prefers_the_better_candidate() {
        // every contiguous fold holds a full period, so folds interpolate
        let rows: Vec<[f64; 1]> = (0..40).map(|i| [f64::from(i % 10)]).collect();
        let y: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i % 10) * 10.0).collect();
        let x = Matrix::from_rows(&rows).unwrap();

        let search = GridSearch::new(
            BoostingGrid {
                n_estimators: vec![1, 60],
                max_depth: vec![3],
                learning_rate: vec![0.3],
            },
            4,
        );
        let result = search.run(&x, &y, &BoostingParams::default()).unwrap();

        assert_eq!(result.scores.len(), 2);
        assert_eq!(result.best_params.n_estimators, 60);
        assert!(result.best_score >= result.scores[0].mean_score);
        assert_eq!(result.model.regressor().n_trees(), 60);
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        // a constant target is matched exactly by every candidate
        let rows: Vec<[f64; 1]> = (0..20).map(|i| [f64::from(i)]).collect();
        let y = vec![50.0; 20];
        let x = Matrix::from_rows(&rows).unwrap();

        let search = GridSearch::new(
            BoostingGrid {
                n_estimators: vec![5, 3],
                max_depth: vec![2],
                learning_rate: vec![0.1],
            },
            4,
        );
        let result = search.run(&x, &y, &BoostingParams::default()).unwrap();

        assert_eq!(result.scores[0].mean_score, result.scores[1].mean_score);
        assert_eq!(result.best_params.n_estimators, 5);
        assert_eq!(result.best_score, result.scores[0].mean_score);
    }

    #[test]
    fn empty_grid_is_an_error() {
        let x = Matrix::from_rows(&[[1.0], [2.0], [3.0]]).unwrap();
        let search = GridSearch::new(
            BoostingGrid {
                n_estimators: vec![],
                ..BoostingGrid::default()
            },
            2,
        );
        assert!(search.run(&x, &[1.0, 2.0, 3.0], &BoostingParams::default()).is_err());
    }
}
