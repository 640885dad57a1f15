use serde::{Deserialize, Serialize};

use super::Matrix;
use crate::Error;

/// Standardizes every column to zero mean and unit variance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learns column means and population standard deviations.
    /// Constant columns get a scale of 1.
    ///
    /// # Errors
    ///
    /// Returns an error on an empty matrix.
    pub fn fit(&mut self, x: &Matrix) -> Result<(), Error> {
        if x.is_empty() {
            return Err(Error::EmptyDataset("cannot fit scaler on no rows"));
        }
        #[allow(clippy::cast_precision_loss)]
        let n = x.n_rows() as f64;

        self.means = (0..x.n_cols()).map(|col| x.column(col).sum::<f64>() / n).collect();
        self.scales = (0..x.n_cols())
            .map(|col| {
                let mean = self.means[col];
                let var = x.column(col).map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// # Errors
    ///
    /// Returns an error if the row width differs from the fitted width.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, Error> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if the column count differs from the fitted width.
    pub fn transform(&self, x: &Matrix) -> Result<Matrix, Error> {
        self.check_width(x.n_cols())?;
        Ok(x.map_rows(|row, out| {
            out.extend(
                row.iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(v, (mean, scale))| (v - mean) / scale),
            );
        }))
    }

    fn check_width(&self, width: usize) -> Result<(), Error> {
        if width == self.means.len() {
            Ok(())
        } else {
            Err(Error::ModelError(format!(
                "scaler fitted on {} features, got {width}",
                self.means.len()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_columns() {
        let x = Matrix::from_rows(&[[1.0, 5.0], [3.0, 5.0]]).unwrap();
        let mut scaler = StandardScaler::default();
        scaler.fit(&x).unwrap();

        let scaled = scaler.transform(&x).unwrap();
        assert_eq!(scaled.row(0), &[-1.0, 0.0]);
        assert_eq!(scaled.row(1), &[1.0, 0.0]);
    }

    #[test]
    fn rejects_width_mismatch() {
        let x = Matrix::from_rows(&[[1.0, 2.0]]).unwrap();
        let mut scaler = StandardScaler::default();
        scaler.fit(&x).unwrap();
        assert!(scaler.transform_row(&[1.0]).is_err());
    }
}
