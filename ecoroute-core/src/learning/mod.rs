//! Regression toolkit: tree ensembles, scaling, validation and metrics.
//!
//! Fitted estimators are plain serde structures, so trained models persist
//! as JSON through [`save_json`] and [`load_json`].

pub mod boosting;
pub mod forest;
pub mod grid_search;
pub mod matrix;
pub mod metrics;
pub mod multi_output;
pub mod pipeline;
pub mod scaler;
pub mod split;
pub mod tree;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use grid_search::{BoostingGrid, GridSearch, GridSearchResult};
pub use matrix::Matrix;
pub use multi_output::MultiOutput;
pub use pipeline::Pipeline;
pub use scaler::StandardScaler;
pub use tree::{RegressionTree, TreeParams};

use crate::Error;

pub trait Regressor: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the training set is empty, inconsistent, or the
    /// estimator parameters are invalid.
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), Error>;

    fn predict_row(&self, row: &[f64]) -> f64;

    fn predict(&self, x: &Matrix) -> Vec<f64> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }
}

pub(crate) fn validate_training_set(x: &Matrix, y: &[f64]) -> Result<(), Error> {
    if x.is_empty() {
        return Err(Error::EmptyDataset("no training rows"));
    }
    if x.n_rows() != y.len() {
        return Err(Error::ModelError(format!(
            "{} feature rows but {} targets",
            x.n_rows(),
            y.len()
        )));
    }
    if let Some(idx) = y.iter().position(|v| !v.is_finite()) {
        return Err(Error::ModelError(format!("non-finite target at row {idx}")));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, value)?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the file cannot be read or does not hold `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inconsistent_training_sets() {
        let x = Matrix::from_rows(&[[1.0], [2.0]]).unwrap();
        assert!(validate_training_set(&x, &[1.0]).is_err());
        assert!(validate_training_set(&x, &[1.0, f64::NAN]).is_err());
        assert!(validate_training_set(&Matrix::default(), &[]).is_err());
        assert!(validate_training_set(&x, &[1.0, 2.0]).is_ok());
    }

    #[test]
    fn fitted_models_persist_as_json() {
        let x = Matrix::from_rows(&[[1.0], [2.0], [3.0], [4.0]]).unwrap();
        let mut model = Pipeline::new(GradientBoosting::new(BoostingParams {
            n_estimators: 5,
            max_depth: 2,
            ..BoostingParams::default()
        }));
        model.fit(&x, &[1.0, 2.0, 3.0, 4.0]).unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        save_json(file.path(), &model).unwrap();
        let loaded: Pipeline<GradientBoosting> = load_json(file.path()).unwrap();

        for (a, b) in loaded.predict(&x).iter().zip(model.predict(&x)) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
