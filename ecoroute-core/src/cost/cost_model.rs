use serde::{Deserialize, Serialize};

use super::ResolvedFactors;
use crate::Error;
use crate::features::FeatureSpec;
use crate::learning::{GradientBoosting, Pipeline, Regressor};
use crate::loading::weather::WeatherTable;
use crate::model::ArcObservation;

/// Boosted model predicting the composite cost directly from the full
/// feature set. Carries its feature layout and traffic factors so that
/// predictions rebuild exactly the training features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    spec: FeatureSpec,
    factors: ResolvedFactors,
    pipeline: Pipeline<GradientBoosting>,
}

impl CostModel {
    pub fn new(
        spec: FeatureSpec,
        factors: ResolvedFactors,
        pipeline: Pipeline<GradientBoosting>,
    ) -> Self {
        Self {
            spec,
            factors,
            pipeline,
        }
    }

    pub fn spec(&self) -> FeatureSpec {
        self.spec
    }

    pub fn factors(&self) -> &ResolvedFactors {
        &self.factors
    }

    pub fn pipeline(&self) -> &Pipeline<GradientBoosting> {
        &self.pipeline
    }

    /// # Errors
    ///
    /// Returns an error if the features cannot be built (missing weather
    /// for a weather-aware model, no observations).
    pub fn predict(
        &self,
        observations: &[ArcObservation],
        weather: Option<&WeatherTable>,
    ) -> Result<Vec<f64>, Error> {
        let x = self.spec.build(observations, &self.factors, weather)?;
        if x.n_cols() != self.pipeline.n_features() {
            return Err(Error::ModelError(format!(
                "model expects {} features, got {}",
                self.pipeline.n_features(),
                x.n_cols()
            )));
        }
        Ok(self.pipeline.predict(&x))
    }
}
