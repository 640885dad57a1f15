use serde::{Deserialize, Serialize};

use super::{Matrix, Regressor, StandardScaler};
use crate::Error;

/// Standard scaling followed by a regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline<R> {
    scaler: StandardScaler,
    regressor: R,
}

impl<R: Regressor> Pipeline<R> {
    pub fn new(regressor: R) -> Self {
        Self {
            scaler: StandardScaler::default(),
            regressor,
        }
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    /// Predicts a single row, checking its width against the fitted scaler
    ///
    /// # Errors
    ///
    /// Returns an error if the row width differs from the training width.
    pub fn try_predict_row(&self, row: &[f64]) -> Result<f64, Error> {
        let scaled = self.scaler.transform_row(row)?;
        Ok(self.regressor.predict_row(&scaled))
    }
}

impl<R: Regressor> Regressor for Pipeline<R> {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), Error> {
        self.scaler.fit(x)?;
        let scaled = self.scaler.transform(x)?;
        self.regressor.fit(&scaled, y)
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        match self.scaler.transform_row(row) {
            Ok(scaled) => self.regressor.predict_row(&scaled),
            Err(_) => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::tree::{RegressionTree, TreeParams};

    #[test]
    fn scales_before_predicting() {
        let x = Matrix::from_rows(&[[100.0], [200.0], [300.0], [400.0]]).unwrap();
        let y = [1.0, 1.0, 2.0, 2.0];
        let mut pipeline = Pipeline::new(RegressionTree::new(TreeParams::default()));
        pipeline.fit(&x, &y).unwrap();

        assert_eq!(pipeline.n_features(), 1);
        assert_eq!(pipeline.try_predict_row(&[150.0]).unwrap(), 1.0);
        assert_eq!(pipeline.predict_row(&[390.0]), 2.0);
        assert!(pipeline.try_predict_row(&[1.0, 2.0]).is_err());
        assert!(pipeline.predict_row(&[1.0, 2.0]).is_nan());
    }
}
