//! Copula Scoring Engine
//!
//! Runs the per-feature pipeline (ECDF, tail surprise, skew correction,
//! contribution floor) over a whole table and assembles the result
//! matrices. Columns are independent until the row-sum aggregation, so they
//! can be evaluated on the rayon pool; the collect is the join point.

use crate::algo::{left_tail, outlier_contribution, right_tail, sign, skew_adjusted, skewness};
use crate::matrix::Matrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Evidence computed for a single feature column.
#[derive(Debug, Clone)]
pub struct ColumnEvidence {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub skew_sign: f64,
    pub skewed: Vec<f64>,
    pub outlier: Vec<f64>,
}

impl ColumnEvidence {
    pub fn compute(column: &[f64]) -> Self {
        let left = left_tail(column);
        let right = right_tail(column);
        let skew_sign = sign(skewness(column));
        let skewed = skew_adjusted(&left, &right, skew_sign);
        let outlier = outlier_contribution(&skewed, &left, &right);
        Self {
            left,
            right,
            skew_sign,
            skewed,
            outlier,
        }
    }
}

/// Intermediate tables of one scoring pass, all `rows x cols` of the table
/// they were computed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopulaTables {
    /// Left-tail surprise `-ln ECDF(x)`
    pub u_left: Matrix,
    /// Right-tail surprise `-ln ECDF'(-x)`
    pub u_right: Matrix,
    /// Skew-adjusted blend of both tails
    pub u_skew: Matrix,
    /// Per-dimension outlier contribution
    pub outlier: Matrix,
    /// Skewness sign per feature
    pub skew_signs: Vec<f64>,
}

impl CopulaTables {
    pub fn compute(table: &Matrix, parallel: bool) -> Self {
        let columns = table.columns();
        let evidence: Vec<ColumnEvidence> = if parallel {
            columns
                .par_iter()
                .map(Vec::as_slice)
                .map(ColumnEvidence::compute)
                .collect()
        } else {
            columns
                .iter()
                .map(Vec::as_slice)
                .map(ColumnEvidence::compute)
                .collect()
        };

        let mut left = Vec::with_capacity(evidence.len());
        let mut right = Vec::with_capacity(evidence.len());
        let mut skewed = Vec::with_capacity(evidence.len());
        let mut outlier = Vec::with_capacity(evidence.len());
        let mut skew_signs = Vec::with_capacity(evidence.len());
        for col in evidence {
            left.push(col.left);
            right.push(col.right);
            skewed.push(col.skewed);
            outlier.push(col.outlier);
            skew_signs.push(col.skew_sign);
        }

        debug!(
            rows = table.rows(),
            cols = table.cols(),
            parallel,
            "computed copula tables"
        );

        Self {
            u_left: Matrix::from_columns(&left),
            u_right: Matrix::from_columns(&right),
            u_skew: Matrix::from_columns(&skewed),
            outlier: Matrix::from_columns(&outlier),
            skew_signs,
        }
    }

    /// Row sums of the contribution matrix, one decision score per row.
    pub fn row_scores(&self) -> Vec<f64> {
        self.outlier.row_sums()
    }
}
