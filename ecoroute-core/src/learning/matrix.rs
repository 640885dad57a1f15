use serde::{Deserialize, Serialize};

use crate::Error;

/// Dense row-major feature matrix
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl Matrix {
    /// # Errors
    ///
    /// Returns an error if `data` does not hold `n_rows * n_cols` values.
    pub fn new(data: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<Self, Error> {
        if data.len() != n_rows * n_cols {
            return Err(Error::ModelError(format!(
                "matrix shape {n_rows}x{n_cols} does not match {} values",
                data.len()
            )));
        }
        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    /// # Errors
    ///
    /// Returns an error if rows have different lengths.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, Error> {
        let n_cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(Error::ModelError(format!(
                    "row {idx} has {} columns, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            n_rows: rows.len(),
            n_cols,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.n_cols..(idx + 1) * self.n_cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, an empty-width matrix has no addressable rows
        self.data.chunks_exact(self.n_cols.max(1)).take(self.n_rows)
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.n_rows).map(move |row| self.get(row, col))
    }

    /// Copies the given rows into a new matrix
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            data,
            n_rows: indices.len(),
            n_cols: self.n_cols,
        }
    }

    pub(crate) fn map_rows(&self, mut f: impl FnMut(&[f64], &mut Vec<f64>)) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.rows() {
            f(row, &mut data);
        }
        Self {
            data,
            n_rows: self.n_rows,
            n_cols: self.n_cols,
        }
    }
}

/// Picks `indices` out of a target vector
pub fn select<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&idx| values[idx]).collect()
}
