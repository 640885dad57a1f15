use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Matrix, Regressor};
use crate::Error;

/// One independent regressor per target column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutput<R> {
    template: R,
    estimators: Vec<R>,
}

impl<R> MultiOutput<R>
where
    R: Regressor + Clone,
{
    pub fn new(template: R) -> Self {
        Self {
            template,
            estimators: Vec::new(),
        }
    }

    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    /// Fits one clone of the template per target, targets in parallel
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any target's regressor.
    pub fn fit(&mut self, x: &Matrix, targets: &[&[f64]]) -> Result<(), Error> {
        if targets.is_empty() {
            return Err(Error::ModelError("no targets to fit".to_string()));
        }
        self.estimators = targets
            .par_iter()
            .map(|y| -> Result<R, Error> {
                let mut estimator = self.template.clone();
                estimator.fit(x, y)?;
                Ok(estimator)
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(())
    }

    pub fn predict_row(&self, row: &[f64]) -> Vec<f64> {
        self.estimators.iter().map(|e| e.predict_row(row)).collect()
    }

    /// Predictions per target column
    pub fn predict(&self, x: &Matrix) -> Vec<Vec<f64>> {
        self.estimators.iter().map(|e| e.predict(x)).collect()
    }
}
