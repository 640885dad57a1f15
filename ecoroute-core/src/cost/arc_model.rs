//! Multi-output forest predicting arc distance and emission from a sensor
//! reading (flow, occupancy and calendar parts).

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::features::sensor_features;
use crate::learning::{ForestParams, Matrix, MultiOutput, RandomForest, StandardScaler};
use crate::model::SensorReading;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcPrediction {
    pub distance_km: f64,
    pub emission_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcFeatureModel {
    scaler: StandardScaler,
    outputs: MultiOutput<RandomForest>,
}

impl ArcFeatureModel {
    pub fn new(params: ForestParams) -> Self {
        Self {
            scaler: StandardScaler::default(),
            outputs: MultiOutput::new(RandomForest::new(params)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the training set is empty or inconsistent.
    pub fn fit(&mut self, x: &Matrix, distance_km: &[f64], emission_g: &[f64]) -> Result<(), Error> {
        self.scaler.fit(x)?;
        let scaled = self.scaler.transform(x)?;
        self.outputs.fit(&scaled, &[distance_km, emission_g])
    }

    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    pub fn predict(&self, reading: &SensorReading) -> Result<ArcPrediction, Error> {
        let scaled = self.scaler.transform_row(&sensor_features(reading))?;
        self.to_prediction(&self.outputs.predict_row(&scaled))
    }

    /// # Errors
    ///
    /// Returns an error if the matrix width differs from the training width.
    pub fn predict_matrix(&self, x: &Matrix) -> Result<Vec<ArcPrediction>, Error> {
        let scaled = self.scaler.transform(x)?;
        let columns = self.outputs.predict(&scaled);
        let [distance, emission] = columns.as_slice() else {
            return Err(Error::ModelError(
                "arc feature model is not fitted".to_string(),
            ));
        };
        Ok(distance
            .iter()
            .zip(emission)
            .map(|(&distance_km, &emission_g)| ArcPrediction {
                distance_km,
                emission_g,
            })
            .collect())
    }

    fn to_prediction(&self, outputs: &[f64]) -> Result<ArcPrediction, Error> {
        match outputs {
            [distance_km, emission_g] => Ok(ArcPrediction {
                distance_km: *distance_km,
                emission_g: *emission_g,
            }),
            _ => Err(Error::ModelError(
                "arc feature model is not fitted".to_string(),
            )),
        }
    }
}
