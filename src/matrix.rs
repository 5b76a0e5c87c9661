//! Dense Row-Major Matrix
//!
//! Every table entering the detector passes through [`Matrix::from_rows`] or
//! [`Matrix::from_vec`], which reject ragged, empty and non-finite input.
//! Deserialized tables are routed through `from_vec` as well.
//! Intermediate score tables reuse the same storage type.

use crate::error::{CopodError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unchecked wire form of a [`Matrix`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MatrixParts {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl TryFrom<MatrixParts> for Matrix {
    type Error = CopodError;

    fn try_from(parts: MatrixParts) -> Result<Self> {
        Matrix::from_vec(parts.rows, parts.cols, parts.data)
    }
}

impl Matrix {
    /// Validate and coerce a sequence of rows into a dense table.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(CopodError::InvalidInput("table has no rows".into()));
        };
        let cols = first.as_ref().len();
        if cols == 0 {
            return Err(CopodError::InvalidInput("table has no columns".into()));
        }

        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(CopodError::InvalidInput(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }

        Self::from_vec(rows.len(), cols, data)
    }

    /// Build from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(CopodError::InvalidInput(format!(
                "table shape {}x{} is empty",
                rows, cols
            )));
        }
        if data.len() != rows * cols {
            return Err(CopodError::InvalidInput(format!(
                "buffer holds {} values, shape {}x{} needs {}",
                data.len(),
                rows,
                cols,
                rows * cols
            )));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(CopodError::InvalidInput(format!(
                "non-finite value {} at row {}, column {}",
                data[pos],
                pos / cols,
                pos % cols
            )));
        }

        Ok(Self { rows, cols, data })
    }

    /// Assemble from per-column vectors of equal length. Used for derived
    /// tables whose entries are produced column by column.
    pub(crate) fn from_columns(columns: &[Vec<f64>]) -> Self {
        let cols = columns.len();
        let rows = columns.first().map_or(0, Vec::len);
        let mut data = vec![0.0; rows * cols];
        for (j, column) in columns.iter().enumerate() {
            for (i, &v) in column.iter().enumerate() {
                data[i * cols + j] = v;
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.data.iter().skip(j).step_by(self.cols).copied().collect()
    }

    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.cols).map(|j| self.column(j)).collect()
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.data
            .chunks(self.cols)
            .map(|row| row.iter().sum())
            .collect()
    }

    /// Stack `other` below `self`.
    pub fn vstack(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.cols {
            return Err(CopodError::InvalidInput(format!(
                "cannot stack {} columns onto {} columns",
                other.cols, self.cols
            )));
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Matrix {
            rows: self.rows + other.rows,
            cols: self.cols,
            data,
        })
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_layout() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.column(1), vec![2.0, 4.0, 6.0]);
        assert_eq!(m.row_sums(), vec![3.0, 7.0, 11.0]);
    }

    #[test]
    fn test_rejects_malformed_tables() {
        let empty: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            Matrix::from_rows(&empty),
            Err(CopodError::InvalidInput(_))
        ));
        assert!(matches!(
            Matrix::from_rows(&[Vec::<f64>::new()]),
            Err(CopodError::InvalidInput(_))
        ));
        assert!(matches!(
            Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]),
            Err(CopodError::InvalidInput(_))
        ));
        assert!(matches!(
            Matrix::from_rows(&[vec![1.0, f64::NAN]]),
            Err(CopodError::InvalidInput(_))
        ));
        assert!(matches!(
            Matrix::from_vec(2, 2, vec![1.0; 3]),
            Err(CopodError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_from_columns_transposes() {
        let m = Matrix::from_columns(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.row(2), &[3.0, 6.0]);
    }

    #[test]
    fn test_vstack() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let c = a.vstack(&b).unwrap();
        assert_eq!(c.rows(), 3);
        assert_eq!(c.row(0), &[1.0, 2.0]);
        assert_eq!(c.row(2), &[5.0, 6.0]);

        let narrow = Matrix::from_rows(&[vec![1.0]]).unwrap();
        assert!(a.vstack(&narrow).is_err());
    }

    #[test]
    fn test_deserialize_validates_shape() {
        let m: Matrix = serde_json::from_str(r#"{"rows":2,"cols":1,"data":[1.0,2.0]}"#).unwrap();
        assert_eq!(m.shape(), (2, 1));

        for bad in [
            r#"{"rows":3,"cols":0,"data":[]}"#,
            r#"{"rows":2,"cols":2,"data":[1.0,2.0,3.0]}"#,
        ] {
            let err = serde_json::from_str::<Matrix>(bad).unwrap_err();
            assert!(err.to_string().contains("table shape") || err.to_string().contains("buffer holds"));
        }
    }
}
