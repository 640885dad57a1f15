//! End-to-end model fitting: arc feature model, tuned cost model and the
//! per-arc cost table consumed by the network builder.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{ArcFeatureModel, CostModel, CostWeights, TrafficFactors};
use crate::Error;
use crate::features::{FeatureSpec, sensor_matrix};
use crate::learning::grid_search::CandidateScore;
use crate::learning::matrix::select;
use crate::learning::metrics::{ConfusionMatrix, median, r2_score, rmse, robust_score};
use crate::learning::split::train_test_split;
use crate::learning::{
    BoostingGrid, BoostingParams, ForestParams, GradientBoosting, GridSearch, Pipeline, Regressor,
};
use crate::loading::weather::WeatherTable;
use crate::model::ArcObservation;
use crate::network::ArcCost;

/// Where the distance and emission of the arc cost table come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    /// Measured polyline length and band emission
    Observed,
    /// Arc feature model output for the row's sensor reading
    #[default]
    Predicted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub weights: CostWeights,
    pub traffic_factors: TrafficFactors,
    pub test_fraction: f64,
    pub seed: u64,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
    pub grid: BoostingGrid,
    pub cv_folds: usize,
    pub tune_cost_model: bool,
    pub cost_source: CostSource,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            weights: CostWeights::default(),
            traffic_factors: TrafficFactors::default(),
            test_fraction: 0.2,
            seed: 42,
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
            grid: BoostingGrid::default(),
            cv_folds: 5,
            tune_cost_model: true,
            cost_source: CostSource::default(),
        }
    }
}

/// Hold-out quality of one regression target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelEvaluation {
    pub r2_train: f64,
    pub r2_test: f64,
    pub rmse_test: f64,
    pub robust_test: f64,
    /// Median of the test truth, the high/low cut of `confusion`
    pub threshold: f64,
    pub confusion: ConfusionMatrix,
}

impl ModelEvaluation {
    fn evaluate(
        target: &str,
        truth: &[f64],
        pred: &[f64],
        train: &[usize],
        test: &[usize],
    ) -> Self {
        let (train_truth, train_pred) = (select(truth, train), select(pred, train));
        let (test_truth, test_pred) = (select(truth, test), select(pred, test));
        let threshold = median(&test_truth);

        let evaluation = Self {
            r2_train: r2_score(&train_truth, &train_pred),
            r2_test: r2_score(&test_truth, &test_pred),
            rmse_test: rmse(&test_truth, &test_pred),
            robust_test: robust_score(&test_truth, &test_pred),
            threshold,
            confusion: ConfusionMatrix::at_threshold(&test_truth, &test_pred, threshold),
        };

        info!(
            "{target}: R2 train {:.4}, R2 test {:.4}, robust score {:.4}",
            evaluation.r2_train, evaluation.r2_test, evaluation.robust_test
        );
        info!(
            "{target}: confusion matrix at {:.3} {:?} (accuracy {:.4})",
            threshold,
            evaluation.confusion.0,
            evaluation.confusion.accuracy()
        );
        evaluation
    }
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub arc_model: ArcFeatureModel,
    pub cost_model: CostModel,
    pub distance: ModelEvaluation,
    pub emission: ModelEvaluation,
    pub cost: ModelEvaluation,
    /// Cross-validated score of every grid candidate, when tuning ran
    pub grid_scores: Option<Vec<CandidateScore>>,
    /// One row per observation, in input order
    pub arc_costs: Vec<ArcCost>,
}

/// Fits both models on a shuffled hold-out split and prices every arc.
///
/// The cost model is tuned by grid search when enabled and the training
/// side holds at least two rows; the fold count shrinks to fit it.
///
/// # Errors
///
/// Returns an error if there are fewer than two observations, the
/// configuration is invalid, or a model fails to fit.
pub fn train(
    observations: &[ArcObservation],
    weather: Option<&WeatherTable>,
    config: &TrainingConfig,
) -> Result<TrainingReport, Error> {
    if observations.is_empty() {
        return Err(Error::EmptyDataset("no observations to train on"));
    }
    let factors = config
        .traffic_factors
        .resolve(observations.iter().map(|o| o.state));
    info!(
        "Training on {} observations, unmapped traffic states weigh {:.3}",
        observations.len(),
        factors.fallback()
    );

    let (train_idx, test_idx) =
        train_test_split(observations.len(), config.test_fraction, config.seed)?;
    info!("Split into {} train / {} test rows", train_idx.len(), test_idx.len());

    let distance: Vec<f64> = observations.iter().map(|o| o.distance_km).collect();
    let emission: Vec<f64> = observations.iter().map(|o| o.emission_g).collect();

    let sensor = sensor_matrix(observations)?;
    let mut arc_model = ArcFeatureModel::new(config.forest.clone());
    arc_model.fit(
        &sensor.select_rows(&train_idx),
        &select(&distance, &train_idx),
        &select(&emission, &train_idx),
    )?;
    let arc_predictions = arc_model.predict_matrix(&sensor)?;
    let predicted_distance: Vec<f64> = arc_predictions.iter().map(|p| p.distance_km).collect();
    let predicted_emission: Vec<f64> = arc_predictions.iter().map(|p| p.emission_g).collect();

    let distance_eval = ModelEvaluation::evaluate(
        "distance",
        &distance,
        &predicted_distance,
        &train_idx,
        &test_idx,
    );
    let emission_eval = ModelEvaluation::evaluate(
        "emission",
        &emission,
        &predicted_emission,
        &train_idx,
        &test_idx,
    );

    let observed_cost: Vec<f64> = observations
        .iter()
        .map(|o| {
            config
                .weights
                .composite_cost(o.distance_km, o.emission_g, factors.factor(o.state))
        })
        .collect();

    let spec = FeatureSpec {
        include_weather: weather.is_some_and(|table| !table.is_empty()),
    };
    let x = spec.build(observations, &factors, weather)?;
    let x_train = x.select_rows(&train_idx);
    let y_train = select(&observed_cost, &train_idx);

    let folds = config.cv_folds.min(train_idx.len());
    let (pipeline, grid_scores) = if config.tune_cost_model && folds >= 2 {
        let result = GridSearch::new(config.grid.clone(), folds).run(
            &x_train,
            &y_train,
            &config.boosting,
        )?;
        (result.model, Some(result.scores))
    } else {
        if config.tune_cost_model {
            warn!(
                "Only {} training rows, fitting the cost model without tuning",
                train_idx.len()
            );
        }
        let mut pipeline = Pipeline::new(GradientBoosting::new(config.boosting.clone()));
        pipeline.fit(&x_train, &y_train)?;
        (pipeline, None)
    };

    let predicted_cost = pipeline.predict(&x);
    let cost_eval =
        ModelEvaluation::evaluate("cost", &observed_cost, &predicted_cost, &train_idx, &test_idx);

    let arc_costs = observations
        .iter()
        .zip(&arc_predictions)
        .map(|(observation, prediction)| {
            let (distance_km, emission_g) = match config.cost_source {
                CostSource::Predicted => (prediction.distance_km, prediction.emission_g),
                CostSource::Observed => (observation.distance_km, observation.emission_g),
            };
            ArcCost {
                arc_id: observation.arc_id,
                label: observation.label.clone(),
                upstream: observation.upstream,
                downstream: observation.downstream,
                shape: observation.shape.clone(),
                distance_km,
                emission_g,
                cost: config.weights.composite_cost(
                    distance_km,
                    emission_g,
                    factors.factor(observation.state),
                ),
            }
        })
        .collect();

    Ok(TrainingReport {
        arc_model,
        cost_model: CostModel::new(spec, factors, pipeline),
        distance: distance_eval,
        emission: emission_eval,
        cost: cost_eval,
        grid_scores,
        arc_costs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::observation;
    use crate::model::TrafficState;

    fn dataset(n: u32) -> Vec<ArcObservation> {
        (0..n)
            .map(|i| {
                let state = if i % 3 == 0 {
                    TrafficState::PreSature
                } else {
                    TrafficState::Fluide
                };
                let end = 2.0 + 0.01 * f64::from(i % 5 + 1);
                observation(
                    i64::from(i),
                    i64::from(i % 7),
                    i64::from(i % 7 + 1),
                    f64::from(100 + (i % 10) * 150),
                    state,
                    &format!("[[2.0, 48.0], [{end}, 48.0]]"),
                    Some(1 + i % 28),
                )
            })
            .collect()
    }

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            forest: ForestParams {
                n_estimators: 10,
                ..ForestParams::default()
            },
            grid: BoostingGrid {
                n_estimators: vec![30],
                max_depth: vec![3, 4],
                learning_rate: vec![0.3],
            },
            cv_folds: 3,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn trains_both_models_and_prices_every_row() {
        let observations = dataset(60);
        let report = train(&observations, None, &quick_config()).unwrap();

        assert_eq!(report.arc_costs.len(), 60);
        assert_eq!(report.grid_scores.as_ref().map(Vec::len), Some(2));
        assert!(report.cost.r2_train > 0.5);
        assert!(report.distance.r2_train.is_finite());
        let [[tn, fp], [fn_, tp]] = report.cost.confusion.0;
        assert_eq!(tn + fp + fn_ + tp, 12);

        assert!(!report.cost_model.spec().include_weather);
        let predicted = report.cost_model.predict(&observations, None).unwrap();
        assert_eq!(predicted.len(), 60);
    }

    #[test]
    fn observed_source_prices_measured_values() {
        let observations = dataset(20);
        let config = TrainingConfig {
            cost_source: CostSource::Observed,
            tune_cost_model: false,
            ..quick_config()
        };
        let report = train(&observations, None, &config).unwrap();
        assert!(report.grid_scores.is_none());

        let first = &report.arc_costs[0];
        assert_eq!(first.distance_km, observations[0].distance_km);
        // row 0 is pre-saturated
        let expected = (0.5 * observations[0].distance_km + 0.5 * observations[0].emission_g) * 1.5;
        assert!((first.cost - expected).abs() < 1e-9);
    }

    #[test]
    fn tiny_datasets_skip_tuning() {
        let observations = dataset(2);
        let report = train(&observations, None, &quick_config()).unwrap();
        assert!(report.grid_scores.is_none());
        assert!(train(&[], None, &quick_config()).is_err());
    }
}
